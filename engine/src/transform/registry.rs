//! Directive registries.
//!
//! A registry maps a directive name to its [`DirectiveInfo`]: the declared
//! usage, a description and a factory producing a fresh instance. The
//! [`CompositeDirectiveRegistry`] consults its backing registries in
//! priority order and the first one that knows a name wins.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use super::directive::Directive;
use super::directives::system_directives;
use super::dsl::UsageDefinition;

/// Produces one fresh, uninitialized directive instance per call.
pub type DirectiveFactory = Arc<dyn Fn() -> Box<dyn Directive> + Send + Sync>;

/// Registration entry for one directive.
///
/// The usage is captured at registration time so listing directives never
/// instantiates one. [`DirectiveInfo::of`] builds one throwaway instance
/// during registration to read its usage.
#[derive(Clone)]
pub struct DirectiveInfo {
    usage: UsageDefinition,
    description: String,
    factory: DirectiveFactory,
}

impl DirectiveInfo {
    pub fn new(
        usage: UsageDefinition,
        description: impl Into<String>,
        factory: impl Fn() -> Box<dyn Directive> + Send + Sync + 'static,
    ) -> Self {
        Self {
            usage,
            description: description.into(),
            factory: Arc::new(factory),
        }
    }

    /// Entry for a directive type constructible through `Default`.
    ///
    /// Creates and discards one default instance to call `define`.
    pub fn of<D>(description: impl Into<String>) -> Self
    where
        D: Directive + Default + 'static,
    {
        Self::new(D::default().define(), description, || {
            Box::new(D::default()) as Box<dyn Directive>
        })
    }

    pub fn name(&self) -> &str {
        self.usage.directive()
    }

    pub fn usage(&self) -> &UsageDefinition {
        &self.usage
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Fresh instance, ready for `initialize`.
    pub fn create(&self) -> Box<dyn Directive> {
        (self.factory)()
    }
}

impl fmt::Debug for DirectiveInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectiveInfo")
            .field("name", &self.name())
            .field("usage", &self.usage.to_string())
            .field("description", &self.description)
            .finish()
    }
}

/// Name lookup over a set of directives.
pub trait DirectiveRegistry: Send + Sync {
    fn get(&self, name: &str) -> Option<&DirectiveInfo>;

    /// All entries, sorted by name.
    fn list(&self) -> Vec<&DirectiveInfo>;
}

fn index(entries: impl IntoIterator<Item = DirectiveInfo>) -> HashMap<String, DirectiveInfo> {
    entries
        .into_iter()
        .map(|info| (info.name().to_string(), info))
        .collect()
}

fn sorted(entries: &HashMap<String, DirectiveInfo>) -> Vec<&DirectiveInfo> {
    let mut list: Vec<&DirectiveInfo> = entries.values().collect();
    list.sort_by(|a, b| a.name().cmp(b.name()));
    list
}

// =============================================================================
// System Registry
// =============================================================================

/// The directives compiled into the engine.
#[derive(Debug)]
pub struct SystemDirectiveRegistry {
    entries: HashMap<String, DirectiveInfo>,
}

impl SystemDirectiveRegistry {
    pub fn new() -> Self {
        Self {
            entries: index(system_directives()),
        }
    }
}

impl Default for SystemDirectiveRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl DirectiveRegistry for SystemDirectiveRegistry {
    fn get(&self, name: &str) -> Option<&DirectiveInfo> {
        self.entries.get(name)
    }

    fn list(&self) -> Vec<&DirectiveInfo> {
        sorted(&self.entries)
    }
}

// =============================================================================
// User Registry
// =============================================================================

/// Directives contributed by the embedding application.
#[derive(Debug, Default)]
pub struct UserDirectiveRegistry {
    entries: HashMap<String, DirectiveInfo>,
}

impl UserDirectiveRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a directive. Returns the entry it replaced, if any.
    pub fn register(&mut self, info: DirectiveInfo) -> Option<DirectiveInfo> {
        self.entries.insert(info.name().to_string(), info)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl DirectiveRegistry for UserDirectiveRegistry {
    fn get(&self, name: &str) -> Option<&DirectiveInfo> {
        self.entries.get(name)
    }

    fn list(&self) -> Vec<&DirectiveInfo> {
        sorted(&self.entries)
    }
}

// =============================================================================
// Composite Registry
// =============================================================================

/// Ordered chain of registries; earlier registries take priority.
#[derive(Default)]
pub struct CompositeDirectiveRegistry {
    registries: Vec<Box<dyn DirectiveRegistry>>,
}

impl CompositeDirectiveRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// System directives only.
    pub fn standard() -> Self {
        Self::new().with(SystemDirectiveRegistry::new())
    }

    /// Append a registry with lower priority than those already added.
    pub fn with(mut self, registry: impl DirectiveRegistry + 'static) -> Self {
        self.registries.push(Box::new(registry));
        self
    }

    /// Known names, sorted and without duplicates.
    pub fn names(&self) -> Vec<&str> {
        self.list().into_iter().map(DirectiveInfo::name).collect()
    }
}

impl fmt::Debug for CompositeDirectiveRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeDirectiveRegistry")
            .field("registries", &self.registries.len())
            .field("names", &self.names())
            .finish()
    }
}

impl DirectiveRegistry for CompositeDirectiveRegistry {
    fn get(&self, name: &str) -> Option<&DirectiveInfo> {
        self.registries.iter().find_map(|registry| registry.get(name))
    }

    fn list(&self) -> Vec<&DirectiveInfo> {
        let mut seen: BTreeMap<&str, &DirectiveInfo> = BTreeMap::new();
        for registry in &self.registries {
            for info in registry.list() {
                seen.entry(info.name()).or_insert(info);
            }
        }
        seen.into_values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ArgumentResult, DirectiveResult};
    use crate::models::Row;
    use crate::transform::context::ExecutionContext;
    use crate::transform::directive::DirectiveOutput;
    use crate::transform::dsl::{Arguments, TokenKind};

    #[derive(Debug, Default)]
    struct Shout {
        column: String,
    }

    impl Directive for Shout {
        fn define(&self) -> UsageDefinition {
            UsageDefinition::builder("uppercase")
                .define("column", TokenKind::ColumnName)
                .build()
        }

        fn initialize(&mut self, args: &Arguments) -> ArgumentResult<()> {
            self.column = args.str("column")?.to_string();
            Ok(())
        }

        fn execute(
            &self,
            rows: Vec<Row>,
            _context: &mut ExecutionContext,
        ) -> DirectiveResult<DirectiveOutput> {
            Ok(rows.into())
        }
    }

    #[test]
    fn test_system_registry_knows_builtins() {
        let registry = SystemDirectiveRegistry::new();
        let info = registry.get("rename").expect("rename is built in");
        assert_eq!(info.usage().to_string(), "rename <old> <new>");
        assert!(registry.get("no-such-directive").is_none());
    }

    #[test]
    fn test_composite_first_match_wins() {
        let mut user = UserDirectiveRegistry::new();
        user.register(DirectiveInfo::of::<Shout>("user override"));
        user.register(DirectiveInfo::new(
            UsageDefinition::builder("shout")
                .define("column", TokenKind::ColumnName)
                .build(),
            "user only",
            || Box::new(Shout::default()) as Box<dyn Directive>,
        ));

        let composite = CompositeDirectiveRegistry::new()
            .with(SystemDirectiveRegistry::new())
            .with(user);

        // System registry has priority for the shared name.
        assert_ne!(composite.get("uppercase").unwrap().description(), "user override");
        assert_eq!(composite.get("shout").unwrap().description(), "user only");
    }

    #[test]
    fn test_list_is_sorted_and_deduplicated() {
        let mut user = UserDirectiveRegistry::new();
        user.register(DirectiveInfo::of::<Shout>("duplicate"));
        let composite = CompositeDirectiveRegistry::standard().with(user);

        let names = composite.names();
        let mut expected = names.clone();
        expected.sort();
        expected.dedup();
        assert_eq!(names, expected);
        assert_eq!(names.iter().filter(|n| **n == "uppercase").count(), 1);
    }

    #[test]
    fn test_factory_yields_fresh_instances() {
        let info = DirectiveInfo::of::<Shout>("test");
        let a = info.create();
        let b = info.create();
        assert_eq!(a.define(), b.define());
        assert_eq!(info.name(), "uppercase");
    }
}
