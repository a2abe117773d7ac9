use serde::Deserialize;

/// An inclusion/exclusion filter. A non-empty `only` list takes precedence
/// and `except` is then ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Selection<K> {
    pub only: Vec<K>,
    pub except: Vec<K>,
}

impl<K> Default for Selection<K> {
    fn default() -> Self {
        Selection {
            only: Vec::new(),
            except: Vec::new(),
        }
    }
}

impl<K: PartialEq> Selection<K> {
    pub fn only(keys: impl IntoIterator<Item = K>) -> Self {
        Selection {
            only: keys.into_iter().collect(),
            except: Vec::new(),
        }
    }

    pub fn except(keys: impl IntoIterator<Item = K>) -> Self {
        Selection {
            only: Vec::new(),
            except: keys.into_iter().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.only.is_empty() && self.except.is_empty()
    }

    pub fn is_excluded(&self, key: &K) -> bool {
        is_excluded(self, key)
    }
}

/// Decide whether `key` is filtered out by `selection`.
pub fn is_excluded<K: PartialEq>(selection: &Selection<K>, key: &K) -> bool {
    if !selection.only.is_empty() {
        return !selection.only.contains(key);
    }
    selection.except.contains(key)
}
