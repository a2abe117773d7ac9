//! Built-in test blocks. They exercise the printer, the template resolver
//! and index selection through the harness itself, so `ultest run` has
//! something to run without any configuration.

use std::rc::Rc;

use inspect::value::ObjectKind;
use inspect::{ObjectRef, Record, Value, print, resolve};
use runner::{BlockContext, BlockRegistry, Capabilities, Selection, TestBlock, TestCase};

pub fn register(registry: &mut BlockRegistry) {
    registry
        .register("printer", printer_block)
        .register("template", template_block)
        .register("selection", selection_block);
}

/// Comparison helpers shared by the built-in blocks.
pub struct Checks;

impl Checks {
    /// Log what was produced and fail the test when it differs from
    /// `expected`.
    pub fn equal<H>(
        &self,
        cx: &BlockContext<H>,
        what: &str,
        actual: Option<String>,
        expected: Option<&str>,
    ) -> Result<(), Value> {
        cx.log(&[Value::from(what), Value::from(actual.clone())]);
        if actual.as_deref() == expected {
            Ok(())
        } else {
            Err(Value::error(format!(
                "{}: expected {:?}, got {:?}",
                what, expected, actual
            )))
        }
    }
}

fn printer_block(_caps: &Capabilities) -> TestBlock<Checks> {
    TestBlock::with_helpers(
        vec![
            TestCase::sync(|cx: &BlockContext<Checks>, _| {
                let ba = Value::record([("b", Value::from(1)), ("a", Value::from(2))]);
                cx.helpers()
                    .equal(cx, "sorted keys", print(&ba, false), Some("{ a: 2, b: 1 }"))
            }),
            TestCase::sync(|cx: &BlockContext<Checks>, _| {
                let checks = cx.helpers();
                checks.equal(cx, "number", print(&Value::from(5), false), Some("5"))?;
                checks.equal(cx, "null", print(&Value::Null, false), None)
            }),
            TestCase::sync(|cx: &BlockContext<Checks>, _| {
                let object = ObjectRef::new(ObjectKind::Plain);
                object.set("shown", Value::from(1));
                object.define("x", Value::from(2), false);
                let value = Value::Object(object);

                let checks = cx.helpers();
                checks.equal(cx, "visible", print(&value, false), Some("{ shown: 1 }"))?;
                checks.equal(cx, "hidden", print(&value, true), Some("{ shown: 1, x: 2 }"))
            }),
            TestCase::sync(|cx: &BlockContext<Checks>, _| {
                let list = ObjectRef::new(ObjectKind::Array);
                let holder = Value::record([("list", Value::Object(list.clone()))]);
                list.push(Value::from(1));
                list.push(holder.clone());

                let printed = print(&holder, false);
                // Break the cycle so both objects are dropped.
                list.borrow_mut().elements.clear();
                cx.helpers()
                    .equal(cx, "cycle", printed, Some("{ list: [ 1, [Circular] ] }"))
            }),
        ],
        Checks,
    )
}

fn template_block(_caps: &Capabilities) -> TestBlock<Checks> {
    TestBlock::with_helpers(
        vec![
            TestCase::sync(|cx: &BlockContext<Checks>, _| {
                let a = Record::new().with("a", 1);
                let b = Record::new().with("b", 2);
                let checks = cx.helpers();
                checks.equal(cx, "fallback", resolve("{a}-{b}", &[&a, &b]), Some("1-2"))?;
                checks.equal(cx, "unresolved", resolve("{a}-{b}", &a), Some("1-{b}"))
            }),
            TestCase::new(|cx: Rc<BlockContext<Checks>>, _| async move {
                let sources = futures::future::ready(
                    Record::new()
                        .with("testBlockName", cx.name())
                        .with("count", 3),
                )
                .await;
                let expected = format!("{} x3", cx.name());
                cx.helpers().equal(
                    &*cx,
                    "async lookup",
                    resolve("{testBlockName} x{count}", &sources),
                    Some(expected.as_str()),
                )
            }),
            TestCase::sync(|cx: &BlockContext<Checks>, _| {
                let value = Value::record([("inner", Value::array([Value::from(1)]))]);
                let sources = Record::new().with("value", value);
                let checks = cx.helpers();
                checks.equal(
                    cx,
                    "composite",
                    resolve("{value}", &sources),
                    Some("{ inner: [ 1 ] }"),
                )?;
                checks.equal(cx, "empty", resolve("", &sources), None)
            }),
        ],
        Checks,
    )
}

fn selection_block(_caps: &Capabilities) -> TestBlock {
    TestBlock::new(vec![
        TestCase::sync(|cx, _| {
            let selection = Selection {
                only: vec![2, 4],
                except: vec![2, 3],
            };
            let excluded: Vec<usize> = (1..=5).filter(|i| selection.is_excluded(i)).collect();
            cx.log(&[Value::from("excluded"), Value::from(format!("{:?}", excluded))]);
            ensure(excluded == [1, 3, 5], "only must win over except")
        }),
        TestCase::sync(|_, _| {
            let selection = Selection::except([1usize]);
            ensure(
                selection.is_excluded(&1) && !selection.is_excluded(&2),
                "except must skip listed indexes",
            )
        }),
        TestCase::sync(|cx, _| {
            cx.expect_error("a non-numeric index must not parse", || {
                "first".parse::<usize>()
            });
            cx.expect_error("indexing past an empty selection must panic", || {
                let selection = Selection::<usize>::default();
                Ok::<usize, ()>(selection.only[0])
            });
            Ok(())
        }),
    ])
}

fn ensure(condition: bool, message: &str) -> Result<(), Value> {
    if condition {
        Ok(())
    } else {
        Err(Value::error(message))
    }
}
