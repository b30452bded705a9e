//! Column model with per-tokenizer token caches.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use super::tokenizer::{TokenSet, Tokenizer};

/// Interpretation of a column's string values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Datatype {
    #[default]
    String,
    Integer,
    Float,
    Date,
    /// Long free text (comments, descriptions).
    Text,
    GeoLocation,
}

impl Datatype {
    /// All datatypes in encoding order.
    pub const ALL: [Datatype; 6] = [
        Datatype::String,
        Datatype::Integer,
        Datatype::Float,
        Datatype::Date,
        Datatype::Text,
        Datatype::GeoLocation,
    ];

    /// One-hot encoding following [`Datatype::ALL`].
    pub fn one_hot(self) -> Vec<f64> {
        Self::ALL
            .iter()
            .map(|datatype| if *datatype == self { 1.0 } else { 0.0 })
            .collect()
    }
}

type TokenCache = RwLock<HashMap<String, TokenSet>>;

/// A column of one table. All values are kept as strings; `datatype` says
/// how to read them.
pub struct Column {
    label: String,
    values: Vec<String>,
    datatype: Datatype,
    /// Owning table name, set when the column is attached to a table.
    table: String,
    label_tokens: TokenCache,
    value_tokens: TokenCache,
}

impl Column {
    pub fn new(label: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            label: label.into(),
            values,
            datatype: Datatype::String,
            table: String::new(),
            label_tokens: RwLock::new(HashMap::new()),
            value_tokens: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_datatype(mut self, datatype: Datatype) -> Self {
        self.datatype = datatype;
        self
    }

    pub(crate) fn attach_to(&mut self, table: &str) {
        self.table = table.to_string();
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn datatype(&self) -> Datatype {
        self.datatype
    }

    /// Name of the owning table.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Tokens of the label, memoized per tokenizer id.
    pub fn label_tokens(&self, tokenizer: &dyn Tokenizer) -> TokenSet {
        memoize(&self.label_tokens, tokenizer, || {
            tokenizer.tokenize(&self.label)
        })
    }

    /// Tokens of all values, memoized per tokenizer id.
    pub fn value_tokens(&self, tokenizer: &dyn Tokenizer) -> TokenSet {
        memoize(&self.value_tokens, tokenizer, || {
            tokenizer.tokenize_all(&self.values)
        })
    }
}

fn memoize(
    cache: &TokenCache,
    tokenizer: &dyn Tokenizer,
    compute: impl FnOnce() -> std::collections::HashSet<String>,
) -> TokenSet {
    let key = tokenizer.id();
    // A poisoned lock only means another reader panicked; the map is still valid.
    if let Some(tokens) = cache
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .get(&key)
    {
        return Arc::clone(tokens);
    }

    let tokens = Arc::new(compute());
    let mut guard = cache.write().unwrap_or_else(|poisoned| poisoned.into_inner());
    Arc::clone(guard.entry(key).or_insert(tokens))
}

impl fmt::Debug for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Column")
            .field("table", &self.table)
            .field("label", &self.label)
            .field("datatype", &self.datatype)
            .field("values", &self.values.len())
            .finish()
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.table, self.label)
    }
}
