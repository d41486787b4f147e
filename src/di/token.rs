use std::any::TypeId;
use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Lookup key for a provider binding.
///
/// A token is either a type (`Token::of::<UserService>()`, also valid for
/// `dyn Trait`) or a string key (`Token::named("url")`).
#[derive(Clone)]
pub enum Token {
    Type { id: TypeId, name: &'static str },
    Named(Cow<'static, str>),
}

impl Token {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Token::Type {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn named(key: impl Into<Cow<'static, str>>) -> Self {
        Token::Named(key.into())
    }

    pub fn name(&self) -> &str {
        match self {
            Token::Type { name, .. } => name,
            Token::Named(key) => key,
        }
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Token::Type { id: a, .. }, Token::Type { id: b, .. }) => a == b,
            (Token::Named(a), Token::Named(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Token {}

impl Hash for Token {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Token::Type { id, .. } => {
                0u8.hash(state);
                id.hash(state);
            }
            Token::Named(key) => {
                1u8.hash(state);
                key.hash(state);
            }
        }
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Type { name, .. } => write!(f, "Token<{name}>"),
            Token::Named(key) => write!(f, "Token({key:?})"),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<&'static str> for Token {
    fn from(key: &'static str) -> Self {
        Token::named(key)
    }
}

impl From<String> for Token {
    fn from(key: String) -> Self {
        Token::named(key)
    }
}
