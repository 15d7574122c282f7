//! Query builder and attribute-based find parameters.
//!
//! Provides a fluent interface for filtering the items held by a store, and
//! [`Parameter`], the `(name, value)` pairs accepted by
//! [`ContentStore::find`](crate::ContentStore::find).

use crate::error::{Result, StoreError};
use crate::item::{ContentItem, DetailValue, ItemId, ItemKey};
use crate::store::ContentStore;

/// A filter predicate that can be applied to items.
type FilterFn<'a> = Box<dyn Fn(&ContentItem) -> bool + 'a>;

/// Fluent query builder over the items currently held by a store.
///
/// Only items already loaded are considered; the `find*` methods on
/// [`ContentStore`] load their scope before querying. Results come back in
/// ascending handle order.
///
/// # Examples
///
/// ```
/// use contentstore::ContentStore;
///
/// # fn example() -> contentstore::Result<()> {
/// let mut store = ContentStore::in_memory()?;
/// let root = store.create("Page", "root", None)?;
/// let news = store.create("Page", "news", Some(root))?;
/// store.save(&[root])?;
///
/// let pages = store.query()
///     .discriminator("Page")
///     .parent(Some(root))
///     .execute()?;
/// assert_eq!(pages, vec![news]);
/// # Ok(())
/// # }
/// ```
pub struct QueryBuilder<'a> {
    store: &'a ContentStore,
    filters: Vec<FilterFn<'a>>,
    limit_value: Option<usize>,
    scope: Option<ItemKey>,
}

impl<'a> QueryBuilder<'a> {
    /// Create a new query builder for the given store.
    pub fn new(store: &'a ContentStore) -> Self {
        Self {
            store,
            filters: Vec::new(),
            limit_value: None,
            scope: None,
        }
    }

    /// Filter items by discriminator.
    pub fn discriminator(mut self, discriminator: impl Into<String>) -> Self {
        let discriminator = discriminator.into();
        self.filters
            .push(Box::new(move |item| item.discriminator() == discriminator));
        self
    }

    /// Filter items by parent. `None` matches root items only.
    pub fn parent(mut self, parent: Option<ItemKey>) -> Self {
        let tree = self.store.tree();
        self.filters
            .push(Box::new(move |item| tree.parent_of(item.key()) == parent));
        self
    }

    /// Restrict the search to the subtree rooted at `root`, root included.
    pub fn below(mut self, root: ItemKey) -> Self {
        self.scope = Some(root);
        self
    }

    /// Filter items by persistent id.
    pub fn id(mut self, id: ItemId) -> Self {
        self.filters.push(Box::new(move |item| item.id() == id));
        self
    }

    /// Filter items by exact name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.filters.push(Box::new(move |item| item.name == name));
        self
    }

    /// Filter items by exact title.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        let title = title.into();
        self.filters.push(Box::new(move |item| item.title == title));
        self
    }

    /// Filter items by name containing a substring (case-insensitive).
    pub fn name_contains(mut self, substring: &str) -> Self {
        let substring = substring.to_lowercase();
        self.filters
            .push(Box::new(move |item| item.name.to_lowercase().contains(&substring)));
        self
    }

    /// Filter items by detail value. Null matches items without the detail.
    pub fn detail(mut self, key: &str, value: impl Into<DetailValue>) -> Self {
        let key = key.to_string();
        let value = value.into();

        self.filters.push(Box::new(move |item| match item.detail(&key) {
            Some(actual) => actual.matches(&value),
            None => value.is_null(),
        }));
        self
    }

    /// Filter items that have a specific detail (regardless of value).
    pub fn detail_exists(mut self, key: &str) -> Self {
        let key = key.to_string();
        self.filters
            .push(Box::new(move |item| item.details.contains_key(&key)));
        self
    }

    /// Filter items using a custom predicate function.
    pub fn custom<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&ContentItem) -> bool + 'a,
    {
        self.filters.push(Box::new(predicate));
        self
    }

    /// Limit the number of results returned.
    pub fn limit(mut self, n: usize) -> Self {
        self.limit_value = Some(n);
        self
    }

    /// Execute the query and return matching handles.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ItemNotFound`] if the [`below`](Self::below)
    /// root is not in the store.
    pub fn execute(&self) -> Result<Vec<ItemKey>> {
        let limit = self.limit_value.unwrap_or(usize::MAX);
        Ok(self
            .matching()?
            .into_iter()
            .take(limit)
            .collect())
    }

    /// Count the matching items.
    pub fn count(&self) -> Result<usize> {
        Ok(self.matching()?.len())
    }

    /// Check if any item matches the query.
    pub fn exists(&self) -> Result<bool> {
        Ok(!self.matching()?.is_empty())
    }

    fn matching(&self) -> Result<Vec<ItemKey>> {
        let tree = self.store.tree();
        let mut candidates = match self.scope {
            Some(root) => {
                if !tree.contains(root) {
                    return Err(StoreError::not_found(root));
                }
                tree.descendants(Some(root))
            }
            None => tree.members().collect(),
        };
        candidates.sort();

        Ok(candidates
            .into_iter()
            .filter(|key| {
                self.store
                    .item(*key)
                    .is_ok_and(|item| self.matches_filters(item))
            })
            .collect())
    }

    /// Check if an item matches all filters.
    fn matches_filters(&self, item: &ContentItem) -> bool {
        self.filters.iter().all(|filter| filter(item))
    }
}

/// One `(name, value)` condition of [`ContentStore::find`](crate::ContentStore::find).
///
/// Well-known names address item fields:
///
/// | name       | value                                  |
/// |------------|----------------------------------------|
/// | `"class"`  | discriminator (string)                 |
/// | `"Parent"` | parent link, or null for "no parent"   |
/// | `"ID"`     | persistent id (int)                    |
/// | `"Name"`   | name (string)                          |
/// | `"Title"`  | title (string)                         |
///
/// Any other name addresses a detail; a null value then matches items
/// without that detail.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    /// Field or detail name
    pub name: String,
    /// Expected value
    pub value: DetailValue,
}

impl Parameter {
    /// Create a parameter.
    pub fn new(name: impl Into<String>, value: impl Into<DetailValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Match items by discriminator.
    pub fn class(discriminator: impl Into<String>) -> Self {
        Self::new("class", DetailValue::String(discriminator.into()))
    }

    /// Match items by parent; `None` matches roots.
    pub fn parent(parent: Option<ItemKey>) -> Self {
        Self::new("Parent", parent)
    }

    /// Narrow `query` by this parameter.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidQuery`] when the name is empty or the
    /// value has the wrong type for a well-known name.
    pub fn apply<'a>(&self, query: QueryBuilder<'a>) -> Result<QueryBuilder<'a>> {
        let mismatch = |expected: &str| {
            StoreError::invalid_query(format!(
                "Parameter '{}' expects {expected}, got {}",
                self.name,
                self.value.type_name()
            ))
        };

        match (self.name.as_str(), &self.value) {
            ("", _) => Err(StoreError::invalid_query("Parameter name is empty")),
            ("class", DetailValue::String(discriminator)) => {
                Ok(query.discriminator(discriminator.clone()))
            }
            ("class", _) => Err(mismatch("a string")),
            ("Parent", DetailValue::Link(parent)) => Ok(query.parent(Some(*parent))),
            ("Parent", DetailValue::Null) => Ok(query.parent(None)),
            ("Parent", _) => Err(mismatch("a link or null")),
            ("ID", DetailValue::Int(id)) if *id > 0 => Ok(query.id(*id as ItemId)),
            ("ID", _) => Err(mismatch("a positive int")),
            ("Name", DetailValue::String(name)) => Ok(query.name(name.clone())),
            ("Name", _) => Err(mismatch("a string")),
            ("Title", DetailValue::String(title)) => Ok(query.title(title.clone())),
            ("Title", _) => Err(mismatch("a string")),
            (detail, value) => Ok(query.detail(detail, value.clone())),
        }
    }
}
