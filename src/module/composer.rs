use std::collections::HashSet;
use std::sync::Arc;

use crate::di::{Injector, Provider, Token};
use crate::error::{Result, ScopixError};
use crate::module::{BOOTSTRAP_MODULE, MetadataRegistry, ModuleRecord};

/// Compose the module tree rooted at `module` into a flat list of records.
///
/// Each module gets its own parentless injector. The tokens in `exports` are
/// bound into it as values already resolved in `parent`, so shared singletons
/// reach children without being constructed twice. Imported modules receive
/// this module's `exports` the same way.
///
/// Fails if any reachable module has no metadata, if any provider cannot be
/// resolved, if a module imports itself through its own imports, or if module
/// names repeat anywhere in the tree.
///
/// The root's name is not checked here. Callers composing a whole application
/// must make sure it is [`BOOTSTRAP_MODULE`]; [`ApplicationBuilder::build`]
/// does.
///
/// [`ApplicationBuilder::build`]: crate::ApplicationBuilder::build
pub fn create_module(
    registry: &MetadataRegistry,
    module: impl Into<Token>,
    parent: Option<&Injector>,
    exports: &[Token],
) -> Result<Vec<ModuleRecord>> {
    let mut path = Vec::new();
    let modules = compose(registry, &module.into(), parent, exports, &mut path)?;
    check_unique_names(&modules)?;
    Ok(modules)
}

/// `path` holds the modules between the top-level call and `module`.
fn compose(
    registry: &MetadataRegistry,
    module: &Token,
    parent: Option<&Injector>,
    exports: &[Token],
    path: &mut Vec<Token>,
) -> Result<Vec<ModuleRecord>> {
    if let Some(start) = path.iter().position(|token| token == module) {
        let cycle = path[start..]
            .iter()
            .chain(std::iter::once(module))
            .map(Token::to_string)
            .collect::<Vec<_>>()
            .join(" -> ");
        return Err(ScopixError::CyclicImport { path: cycle });
    }

    let provider = registry.verify_provider(module)?;
    let metadata = registry.get_component_config(module)?;

    let shared = exports
        .iter()
        .map(|token| share(parent, token))
        .collect::<Result<Vec<_>>>()?;

    let injector = Injector::builder()
        .providers(metadata.providers.iter().cloned())
        .overrides(shared)
        .resolve(provider.clone())?;

    tracing::debug!(
        module = %metadata.name,
        imports = metadata.imports.len(),
        inherited = exports.len(),
        "module injector resolved"
    );

    let record = ModuleRecord {
        name: metadata.name.clone(),
        injector: Arc::clone(&injector),
        provider,
        controllers: metadata.controllers.clone(),
    };

    path.push(module.clone());
    let children = metadata
        .imports
        .iter()
        .map(|child| compose(registry, child, Some(&injector), &metadata.exports, path))
        .collect::<Result<Vec<_>>>();
    path.pop();
    let children = children?;

    Ok(std::iter::once(record)
        .chain(children.into_iter().flatten())
        .collect())
}

/// Bind the parent's resolved instance for `token` as a value.
fn share(parent: Option<&Injector>, token: &Token) -> Result<Provider> {
    let parent = parent.ok_or_else(|| ScopixError::not_found(token))?;
    Ok(Provider::instance(token.clone(), parent.get_any(token)?))
}

/// Names that occur more than once, each listed once, in order of first repeat.
pub fn duplicate_names(modules: &[ModuleRecord]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut duplicates: Vec<String> = Vec::new();
    for record in modules {
        if !seen.insert(record.name.as_str()) && !duplicates.contains(&record.name) {
            duplicates.push(record.name.clone());
        }
    }
    duplicates
}

fn check_unique_names(modules: &[ModuleRecord]) -> Result<()> {
    let duplicates = duplicate_names(modules);
    if duplicates.iter().any(|name| name == BOOTSTRAP_MODULE) {
        return Err(ScopixError::DuplicateBootstrapModule);
    }
    if !duplicates.is_empty() {
        return Err(ScopixError::DuplicateModuleNames { names: duplicates });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::di::Injectable;
    use crate::module::{Module, ModuleMetadata, get_module};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn module_token(name: &str) -> Token {
        Token::named(format!("module:{name}"))
    }

    fn declare(registry: &mut MetadataRegistry, metadata: ModuleMetadata) {
        let token = module_token(&metadata.name);
        registry.insert(Provider::value(token, ()), metadata);
    }

    #[test]
    fn test_flattens_tree_depth_first() {
        let mut registry = MetadataRegistry::new();
        declare(
            &mut registry,
            ModuleMetadata::new("bootstrap")
                .import(module_token("users"))
                .import(module_token("orders")),
        );
        declare(
            &mut registry,
            ModuleMetadata::new("users").import(module_token("profiles")),
        );
        declare(&mut registry, ModuleMetadata::new("profiles"));
        declare(&mut registry, ModuleMetadata::new("orders"));

        let modules = create_module(&registry, module_token("bootstrap"), None, &[]).unwrap();
        let names: Vec<&str> = modules.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["bootstrap", "users", "profiles", "orders"]);
        assert!(get_module(&modules, "profiles").is_some());
    }

    #[test]
    fn test_exported_instance_is_shared_with_child() {
        let built = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&built);

        let mut registry = MetadataRegistry::new();
        declare(
            &mut registry,
            ModuleMetadata::new("bootstrap")
                .import(module_token("users"))
                .export("db")
                .provider(Provider::factory("db", move |_| {
                    Ok(counter.fetch_add(1, Ordering::SeqCst))
                })),
        );
        declare(&mut registry, ModuleMetadata::new("users"));

        let modules = create_module(&registry, module_token("bootstrap"), None, &[]).unwrap();
        let root = get_module(&modules, BOOTSTRAP_MODULE).unwrap();
        let users = get_module(&modules, "users").unwrap();

        let db = Token::named("db");
        assert!(Arc::ptr_eq(
            &root.injector.get_any(&db).unwrap(),
            &users.injector.get_any(&db).unwrap()
        ));
        assert_eq!(built.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unexported_provider_is_invisible_to_child() {
        let mut registry = MetadataRegistry::new();
        declare(
            &mut registry,
            ModuleMetadata::new("bootstrap")
                .import(module_token("users"))
                .export("db")
                .provider(Provider::value("db", String::from("pool")))
                .provider(Provider::value("secret", String::from("hunter2"))),
        );
        declare(
            &mut registry,
            ModuleMetadata::new("users").import(module_token("audit")),
        );
        declare(&mut registry, ModuleMetadata::new("audit"));

        let modules = create_module(&registry, module_token("bootstrap"), None, &[]).unwrap();
        let users = get_module(&modules, "users").unwrap();
        let audit = get_module(&modules, "audit").unwrap();

        assert!(matches!(
            users.injector.get_any(&Token::named("secret")),
            Err(ScopixError::DependencyNotFound { .. })
        ));
        // "users" does not re-export "db", so it stops there.
        assert!(users.injector.contains(&Token::named("db")));
        assert!(!audit.injector.contains(&Token::named("db")));
    }

    #[test]
    fn test_re_export_reaches_grandchild() {
        let mut registry = MetadataRegistry::new();
        declare(
            &mut registry,
            ModuleMetadata::new("bootstrap")
                .import(module_token("users"))
                .export("db")
                .provider(Provider::value("db", String::from("pool"))),
        );
        declare(
            &mut registry,
            ModuleMetadata::new("users")
                .import(module_token("audit"))
                .export("db"),
        );
        declare(&mut registry, ModuleMetadata::new("audit"));

        let modules = create_module(&registry, module_token("bootstrap"), None, &[]).unwrap();
        let db = Token::named("db");
        let root = modules[0].injector.get_any(&db).unwrap();
        let audit = get_module(&modules, "audit").unwrap();
        assert!(Arc::ptr_eq(&root, &audit.injector.get_any(&db).unwrap()));
    }

    #[test]
    fn test_child_provider_needing_unexported_token_fails() {
        let mut registry = MetadataRegistry::new();
        declare(
            &mut registry,
            ModuleMetadata::new("bootstrap")
                .import(module_token("users"))
                .provider(Provider::value("db", String::from("pool"))),
        );
        declare(
            &mut registry,
            ModuleMetadata::new("users").provider(Provider::factory("repo", |injector| {
                injector.get_by::<String>(&Token::named("db"))
            })),
        );

        let err = create_module(&registry, module_token("bootstrap"), None, &[]).unwrap_err();
        assert!(matches!(err, ScopixError::DependencyNotFound { token } if token == "db"));
    }

    #[test]
    fn test_duplicate_bootstrap_is_rejected() {
        let mut registry = MetadataRegistry::new();
        declare(
            &mut registry,
            ModuleMetadata::new("bootstrap").import(module_token("nested")),
        );
        registry.insert(
            Provider::value(module_token("nested"), ()),
            ModuleMetadata::new("bootstrap"),
        );

        let err = create_module(&registry, module_token("bootstrap"), None, &[]).unwrap_err();
        assert!(matches!(err, ScopixError::DuplicateBootstrapModule));
    }

    #[test]
    fn test_duplicate_names_listed_once_each() {
        let mut registry = MetadataRegistry::new();
        declare(
            &mut registry,
            ModuleMetadata::new("bootstrap")
                .import(module_token("a"))
                .import(module_token("a"))
                .import(module_token("a"))
                .import(module_token("b"))
                .import(module_token("b")),
        );
        declare(&mut registry, ModuleMetadata::new("a"));
        declare(&mut registry, ModuleMetadata::new("b"));

        let err = create_module(&registry, module_token("bootstrap"), None, &[]).unwrap_err();
        match err {
            ScopixError::DuplicateModuleNames { names } => assert_eq!(names, vec!["a", "b"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_import_cycle_is_rejected() {
        let mut registry = MetadataRegistry::new();
        declare(
            &mut registry,
            ModuleMetadata::new("bootstrap").import(module_token("users")),
        );
        declare(
            &mut registry,
            ModuleMetadata::new("users").import(module_token("audit")),
        );
        declare(
            &mut registry,
            ModuleMetadata::new("audit").import(module_token("users")),
        );

        let err = create_module(&registry, module_token("bootstrap"), None, &[]).unwrap_err();
        match err {
            ScopixError::CyclicImport { path } => {
                assert_eq!(path, "module:users -> module:audit -> module:users");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_shared_import_is_not_a_cycle() {
        let mut registry = MetadataRegistry::new();
        declare(
            &mut registry,
            ModuleMetadata::new("bootstrap")
                .import(module_token("users"))
                .import(module_token("orders")),
        );
        declare(
            &mut registry,
            ModuleMetadata::new("users").import(module_token("audit")),
        );
        declare(
            &mut registry,
            ModuleMetadata::new("orders").import(module_token("audit")),
        );
        declare(&mut registry, ModuleMetadata::new("audit"));

        // Reached twice, but never through itself: a name clash, not a cycle.
        let err = create_module(&registry, module_token("bootstrap"), None, &[]).unwrap_err();
        assert!(matches!(err, ScopixError::DuplicateModuleNames { names } if names == vec!["audit"]));
    }

    #[test]
    fn test_root_name_is_left_to_the_caller() {
        let mut registry = MetadataRegistry::new();
        declare(
            &mut registry,
            ModuleMetadata::new("app").import(module_token("users")),
        );
        declare(&mut registry, ModuleMetadata::new("users"));

        let modules = create_module(&registry, module_token("app"), None, &[]).unwrap();
        assert_eq!(modules[0].name, "app");
    }

    #[test]
    fn test_missing_import_metadata_aborts() {
        let mut registry = MetadataRegistry::new();
        declare(
            &mut registry,
            ModuleMetadata::new("bootstrap").import(module_token("ghost")),
        );

        let err = create_module(&registry, module_token("bootstrap"), None, &[]).unwrap_err();
        assert!(matches!(err, ScopixError::MissingMetadata { module } if module == "module:ghost"));
    }

    #[test]
    fn test_subtree_with_explicit_parent_exports() {
        let mut registry = MetadataRegistry::new();
        declare(&mut registry, ModuleMetadata::new("users"));
        let parent = Injector::builder()
            .provider(Provider::value("db", String::from("pool")))
            .build();

        let modules =
            create_module(&registry, module_token("users"), Some(&parent), &[Token::named("db")])
                .unwrap();
        assert_eq!(modules.len(), 1);
        assert!(Arc::ptr_eq(
            &parent.get_any(&Token::named("db")).unwrap(),
            &modules[0].injector.get_any(&Token::named("db")).unwrap()
        ));
    }

    struct Database {
        url: &'static str,
    }

    impl Injectable for Database {
        fn inject(_injector: &Injector) -> Result<Self> {
            Ok(Database { url: "postgres://localhost" })
        }
    }

    struct AppModule;

    impl Injectable for AppModule {
        fn inject(_injector: &Injector) -> Result<Self> {
            Ok(AppModule)
        }
    }

    impl Module for AppModule {
        fn metadata() -> ModuleMetadata {
            ModuleMetadata::new(BOOTSTRAP_MODULE)
                .import(Token::of::<UsersModule>())
                .export(Token::of::<Database>())
                .provider(Provider::class::<Database>())
        }

        fn register(registry: &mut MetadataRegistry) {
            registry.register::<Self>();
            UsersModule::register(registry);
        }
    }

    struct UsersModule {
        database: Arc<Database>,
    }

    impl Injectable for UsersModule {
        fn inject(injector: &Injector) -> Result<Self> {
            Ok(UsersModule {
                database: injector.get::<Database>()?,
            })
        }
    }

    impl Module for UsersModule {
        fn metadata() -> ModuleMetadata {
            ModuleMetadata::new("users")
        }
    }

    #[test]
    fn test_typed_module_receives_exported_dependency() {
        let mut registry = MetadataRegistry::new();
        AppModule::register(&mut registry);

        let modules = create_module(&registry, Token::of::<AppModule>(), None, &[]).unwrap();
        let users = get_module(&modules, "users").unwrap();
        let module = users.injector.get::<UsersModule>().unwrap();

        assert_eq!(module.database.url, "postgres://localhost");
        assert!(Arc::ptr_eq(
            &module.database,
            &modules[0].injector.get::<Database>().unwrap()
        ));
    }

    #[test]
    fn test_duplicate_names_helper_on_empty_list() {
        assert!(duplicate_names(&[]).is_empty());
    }
}
