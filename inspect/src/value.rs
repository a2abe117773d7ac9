use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

/// A runtime value as seen by the printer and the template layer.
#[derive(Debug, Clone)]
pub enum Value {
    Undefined,
    Null,
    Boolean(bool),
    Number(f64),
    String(String),
    /// Shared, mutable object. Plain records and arrays both live here.
    Object(ObjectRef),
    Function(Callable),
    /// An async result that has not settled yet.
    Pending,
    Error(ErrorObject),
}

impl Value {
    /// A fresh, empty plain object.
    pub fn object() -> Self {
        Value::Object(ObjectRef::new(ObjectKind::Plain))
    }

    /// A plain object with the given enumerable properties, in order.
    pub fn record<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        let object = ObjectRef::new(ObjectKind::Plain);
        for (name, value) in entries {
            object.set(name, value);
        }
        Value::Object(object)
    }

    pub fn array(items: impl IntoIterator<Item = Value>) -> Self {
        let object = ObjectRef::new(ObjectKind::Array);
        object.borrow_mut().elements.extend(items);
        Value::Object(object)
    }

    pub fn function(name: impl Into<String>, func: impl Fn(&[Value]) -> Value + 'static) -> Self {
        Value::Function(Callable::new(name, func))
    }

    pub fn error(message: impl Into<String>) -> Self {
        Value::Error(ErrorObject::new(message))
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Everything except `Undefined` counts as a defined value.
    pub fn is_defined(&self) -> bool {
        !matches!(self, Value::Undefined)
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    /// Applies the object's primitive conversion, if it has one.
    /// Anything without a conversion comes back as a clone of itself.
    pub fn to_primitive(&self) -> Value {
        if let Value::Object(object) = self {
            if let Some(primitive) = &object.borrow().primitive {
                return primitive.clone();
            }
        }
        self.clone()
    }
}

/// Number formatting shared by `Display` and the printer: integral values
/// print without a fraction.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let sign = if n > 0.0 { "" } else { "-" };
        format!("{}Infinity", sign)
    } else if n == n.floor() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", format_number(*n)),
            Value::String(s) => write!(f, "{}", s),
            Value::Object(object) => {
                if let Some(primitive) = &object.borrow().primitive {
                    return write!(f, "{}", primitive);
                }
                match object.kind() {
                    ObjectKind::Plain => write!(f, "[object Object]"),
                    ObjectKind::Array => write!(f, "[object Array]"),
                }
            }
            Value::Function(_) => write!(f, "[Function]"),
            Value::Pending => write!(f, "[Promise]"),
            Value::Error(error) => write!(f, "{}", error),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) => true,
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b, // NaN != NaN
            (Value::String(a), Value::String(b)) => a == b,
            // Objects and functions compare by identity.
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(&a.func, &b.func),
            (Value::Pending, Value::Pending) => true,
            (Value::Error(a), Value::Error(b)) => a == b,
            _ => false,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Number(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<ErrorObject> for Value {
    fn from(error: ErrorObject) -> Self {
        Value::Error(error)
    }
}

impl From<ObjectRef> for Value {
    fn from(object: ObjectRef) -> Self {
        Value::Object(object)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Undefined, Into::into)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Plain,
    Array,
}

/// A named property slot on an object.
#[derive(Debug, Clone)]
pub struct Property {
    pub name: String,
    pub value: Value,
    pub enumerable: bool,
}

#[derive(Debug)]
pub struct Object {
    pub kind: ObjectKind,
    /// Indexed elements. Always empty for plain objects.
    pub elements: Vec<Value>,
    /// Named properties in definition order.
    pub properties: Vec<Property>,
    pub prototype: Option<ObjectRef>,
    /// Primitive the object converts to (dates, boxed numbers).
    pub primitive: Option<Value>,
}

impl Object {
    pub fn own(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Names of own properties, hidden ones included only when asked.
    pub fn own_names(&self, include_hidden: bool) -> Vec<String> {
        self.properties
            .iter()
            .filter(|p| include_hidden || p.enumerable)
            .map(|p| p.name.clone())
            .collect()
    }
}

/// Shared handle to an [`Object`]. Cloning the handle aliases the object.
#[derive(Clone)]
pub struct ObjectRef(Rc<RefCell<Object>>);

impl ObjectRef {
    pub fn new(kind: ObjectKind) -> Self {
        ObjectRef(Rc::new(RefCell::new(Object {
            kind,
            elements: Vec::new(),
            properties: Vec::new(),
            prototype: None,
            primitive: None,
        })))
    }

    pub fn borrow(&self) -> Ref<'_, Object> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, Object> {
        self.0.borrow_mut()
    }

    pub fn kind(&self) -> ObjectKind {
        self.0.borrow().kind
    }

    /// Identity of the underlying allocation, used for cycle detection.
    pub fn id(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }

    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Looks a name up on the object, then along its prototype chain.
    /// Array elements are reachable through their decimal index.
    pub fn get(&self, name: &str) -> Option<Value> {
        let object = self.0.borrow();
        if object.kind == ObjectKind::Array {
            if let Ok(index) = name.parse::<usize>() {
                if let Some(element) = object.elements.get(index) {
                    return Some(element.clone());
                }
            }
        }
        if let Some(property) = object.own(name) {
            return Some(property.value.clone());
        }
        object.prototype.as_ref().and_then(|proto| proto.get(name))
    }

    /// Assigns an own property, keeping the existing enumerable flag if the
    /// property already exists.
    pub fn set(&self, name: impl Into<String>, value: Value) {
        let name = name.into();
        let mut object = self.0.borrow_mut();
        match object.properties.iter_mut().find(|p| p.name == name) {
            Some(property) => property.value = value,
            None => object.properties.push(Property {
                name,
                value,
                enumerable: true,
            }),
        }
    }

    /// Defines (or redefines) an own property with an explicit enumerable flag.
    pub fn define(&self, name: impl Into<String>, value: Value, enumerable: bool) {
        let name = name.into();
        let mut object = self.0.borrow_mut();
        object.properties.retain(|p| p.name != name);
        object.properties.push(Property {
            name,
            value,
            enumerable,
        });
    }

    pub fn push(&self, value: Value) {
        self.0.borrow_mut().elements.push(value);
    }

    pub fn set_prototype(&self, prototype: Option<ObjectRef>) {
        self.0.borrow_mut().prototype = prototype;
    }

    pub fn set_primitive(&self, primitive: Option<Value>) {
        self.0.borrow_mut().primitive = primitive;
    }
}

// Objects may be cyclic, so Debug never descends into them.
impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectRef({:?} @ {:#x})", self.kind(), self.id())
    }
}

/// A native callable value.
#[derive(Clone)]
pub struct Callable {
    name: Rc<str>,
    func: Rc<dyn Fn(&[Value]) -> Value>,
}

impl Callable {
    pub fn new(name: impl Into<String>, func: impl Fn(&[Value]) -> Value + 'static) -> Self {
        Callable {
            name: Rc::from(name.into()),
            func: Rc::new(func),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, args: &[Value]) -> Value {
        (self.func)(args)
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Callable({})", self.name)
    }
}

/// An error value: a thrown failure or one built by hand.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorObject {
    pub name: String,
    pub message: String,
    pub stack: Option<String>,
}

impl ErrorObject {
    pub fn new(message: impl Into<String>) -> Self {
        Self::named("Error", message)
    }

    pub fn named(name: impl Into<String>, message: impl Into<String>) -> Self {
        ErrorObject {
            name: name.into(),
            message: message.into(),
            stack: None,
        }
    }

    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }
}

impl fmt::Display for ErrorObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}: {}", self.name, self.message)
        }
    }
}

impl std::error::Error for ErrorObject {}
