use std::future::Future;
use std::rc::Rc;

use futures::FutureExt;
use futures::future::LocalBoxFuture;
use inspect::Value;

use crate::capability::Capabilities;

/// The settled outcome of one test function. `Err` is a thrown value.
pub type TestFuture = LocalBoxFuture<'static, Result<(), Value>>;

type TestFn<H> = dyn Fn(Rc<BlockContext<H>>, usize) -> TestFuture;

/// The context test functions run against: the block's name, its
/// capabilities and its helpers.
pub struct BlockContext<H> {
    name: String,
    caps: Capabilities,
    helpers: H,
}

impl<H> BlockContext<H> {
    pub(crate) fn new(name: String, caps: Capabilities, helpers: H) -> Self {
        BlockContext {
            name,
            caps,
            helpers,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn helpers(&self) -> &H {
        &self.helpers
    }

    pub fn caps(&self) -> &Capabilities {
        &self.caps
    }

    pub fn assert(&self, condition: bool, args: &[Value]) -> bool {
        self.caps.assert(condition, args)
    }

    pub fn log(&self, args: &[Value]) {
        self.caps.log(args)
    }

    pub fn error(&self, error: impl Into<Value>) {
        self.caps.error(error)
    }

    pub fn expect_error<T, E>(&self, message: impl Into<Value>, f: impl FnOnce() -> Result<T, E>) {
        self.caps.expect_error(message, f)
    }
}

/// One test function. Called with the zero-based index of the test.
pub struct TestCase<H> {
    run: Rc<TestFn<H>>,
}

impl<H> Clone for TestCase<H> {
    fn clone(&self) -> Self {
        TestCase {
            run: Rc::clone(&self.run),
        }
    }
}

impl<H: 'static> TestCase<H> {
    /// An asynchronous test.
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(Rc<BlockContext<H>>, usize) -> Fut + 'static,
        Fut: Future<Output = Result<(), Value>> + 'static,
    {
        let f = Rc::new(f);
        TestCase {
            run: Rc::new(move |cx: Rc<BlockContext<H>>, index: usize| -> TestFuture {
                let f = Rc::clone(&f);
                // The call itself happens on first poll, so a panic while
                // building the future is caught like any other.
                async move { f(cx, index).await }.boxed_local()
            }),
        }
    }

    /// A synchronous test.
    pub fn sync<F>(f: F) -> Self
    where
        F: Fn(&BlockContext<H>, usize) -> Result<(), Value> + 'static,
    {
        let f = Rc::new(f);
        TestCase {
            run: Rc::new(move |cx: Rc<BlockContext<H>>, index: usize| -> TestFuture {
                let f = Rc::clone(&f);
                async move { f(&cx, index) }.boxed_local()
            }),
        }
    }

    pub(crate) fn invoke(&self, cx: Rc<BlockContext<H>>, index: usize) -> TestFuture {
        (self.run)(cx, index)
    }
}

/// What a block factory returns: the ordered tests plus the helpers they
/// can reach through their context.
pub struct TestBlock<H = ()> {
    pub tests: Vec<TestCase<H>>,
    pub helpers: H,
}

impl TestBlock<()> {
    pub fn new(tests: Vec<TestCase<()>>) -> Self {
        TestBlock { tests, helpers: () }
    }
}

impl<H> TestBlock<H> {
    pub fn with_helpers(tests: Vec<TestCase<H>>, helpers: H) -> Self {
        TestBlock { tests, helpers }
    }
}
