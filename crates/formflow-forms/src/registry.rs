//! The in-memory form registry and validator cache.
//!
//! A [`FormRegistry`] owns every registered [`FormDefinition`] plus the
//! validators compiled from their schemas. It is shared with the middleware
//! behind an `Arc`; interior `RwLock`s keep registration and lookup safe
//! across concurrent requests.
//!
//! Registrations expire: an entry idle for at least the configured timeout
//! is removed during the cleanup pass that runs at the start of every
//! [`add_form`](FormRegistry::add_form) call. Nothing runs on a timer.
//! Validator cache entries are left in place when their definition is
//! evicted; they are replaced on the next re-registration.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use http::Method;

use formflow_core::settings::MINIMAL_EXPIRED_TIMEOUT_SECS;
use formflow_core::{FormFlowResult, Settings};

use crate::definition::FormDefinition;
use crate::schema::CompiledValidator;

/// Options accepted by [`FormRegistry::add_form`].
#[derive(Debug, Clone, Copy, Default)]
pub struct AddFormOptions {
    /// Accepted for compatibility; registration always overwrites.
    pub recreate: bool,
    /// Marks the definition as a generated one-off form.
    pub is_random: bool,
}

struct RegisteredForm {
    definition: FormDefinition,
    registered_at: Instant,
}

/// The owned, synchronized store of form definitions and compiled validators.
///
/// # Examples
///
/// ```
/// use formflow_forms::{AddFormOptions, FormDefinition, FormRegistry};
///
/// let registry = FormRegistry::new();
/// let definition = FormDefinition::builder("contact")
///     .method(http::Method::POST)
///     .action("/contact")
///     .build();
/// registry.add_form("contact", definition, AddFormOptions::default()).unwrap();
///
/// let found = registry.get_request_form_definition(&http::Method::POST, "/contact", None);
/// assert!(found.is_some());
/// ```
pub struct FormRegistry {
    forms: RwLock<HashMap<String, RegisteredForm>>,
    validators: RwLock<HashMap<String, Arc<CompiledValidator>>>,
    timeout: Duration,
}

impl Default for FormRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FormRegistry {
    /// Creates a registry with the default five-minute expiry timeout.
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(MINIMAL_EXPIRED_TIMEOUT_SECS))
    }

    /// Creates a registry with an explicit expiry timeout.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            forms: RwLock::new(HashMap::new()),
            validators: RwLock::new(HashMap::new()),
            timeout,
        }
    }

    /// Creates a registry using the configured cache timeout.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::with_timeout(settings.form_cache_timeout())
    }

    /// Registers a form definition under the given name.
    ///
    /// Runs the expiry cleanup pass first, stamps the entry with the current
    /// instant, and silently overwrites any existing registration. When the
    /// definition carries a field schema, a validator is compiled from it
    /// (plus the definition's plugins) and cached under the same name.
    ///
    /// # Errors
    ///
    /// Returns [`FormFlowError::ConfigurationError`] when the schema fails
    /// to compile, for example on an invalid `Pattern` regex. The
    /// definition itself is still registered in that case.
    ///
    /// [`FormFlowError::ConfigurationError`]: formflow_core::FormFlowError::ConfigurationError
    pub fn add_form(
        &self,
        name: impl Into<String>,
        mut definition: FormDefinition,
        options: AddFormOptions,
    ) -> FormFlowResult<()> {
        let name = name.into();
        self.clean_all_definitions();

        definition.is_random = options.is_random;

        let fields = definition.fields.clone();
        let plugins = definition.validator_plugins.clone();

        tracing::debug!(form = %name, has_schema = fields.is_some(), "registering form");

        self.forms
            .write()
            .expect("form registry lock poisoned")
            .insert(
                name.clone(),
                RegisteredForm {
                    definition,
                    registered_at: Instant::now(),
                },
            );

        if let Some(schema) = fields {
            let validator = CompiledValidator::compile(&schema, &plugins)?;
            self.validators
                .write()
                .expect("validator cache lock poisoned")
                .insert(name, Arc::new(validator));
        }

        Ok(())
    }

    /// Removes every definition idle for at least the expiry timeout.
    ///
    /// Invoked from [`add_form`](Self::add_form); cached validators are not
    /// touched.
    pub fn clean_all_definitions(&self) {
        let mut forms = self.forms.write().expect("form registry lock poisoned");
        let before = forms.len();
        forms.retain(|_, entry| entry.registered_at.elapsed() < self.timeout);
        let evicted = before - forms.len();
        if evicted > 0 {
            tracing::debug!(evicted, "expired form definitions removed");
        }
    }

    /// Finds the definition matching an incoming request.
    ///
    /// Non-GET requests match on method and action path. GET requests
    /// additionally require the `form_id` query parameter to equal the
    /// definition's name; a GET without `form_id` matches nothing.
    pub fn get_request_form_definition(
        &self,
        method: &Method,
        path: &str,
        form_id: Option<&str>,
    ) -> Option<FormDefinition> {
        let forms = self.forms.read().expect("form registry lock poisoned");
        forms
            .values()
            .find(|entry| {
                let definition = &entry.definition;
                if definition.method != *method || definition.action != path {
                    return false;
                }
                if *method == Method::GET {
                    form_id.is_some_and(|id| id == definition.name)
                } else {
                    true
                }
            })
            .map(|entry| entry.definition.clone())
    }

    /// Returns the cached compiled validator for the given form name.
    pub fn validator(&self, name: &str) -> Option<Arc<CompiledValidator>> {
        self.validators
            .read()
            .expect("validator cache lock poisoned")
            .get(name)
            .cloned()
    }

    /// Returns `true` if a definition is registered under the given name.
    pub fn contains(&self, name: &str) -> bool {
        self.forms
            .read()
            .expect("form registry lock poisoned")
            .contains_key(name)
    }

    /// Returns the number of registered definitions.
    pub fn len(&self) -> usize {
        self.forms
            .read()
            .expect("form registry lock poisoned")
            .len()
    }

    /// Returns `true` if no definitions are registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for FormRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormRegistry")
            .field("forms", &self.len())
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldSchema, FieldSpec, FieldType};

    fn definition(name: &str, method: Method, action: &str) -> FormDefinition {
        FormDefinition::builder(name)
            .method(method)
            .action(action)
            .build()
    }

    #[test]
    fn test_add_and_find_post_form() {
        let registry = FormRegistry::new();
        registry
            .add_form(
                "contact",
                definition("contact", Method::POST, "/contact"),
                AddFormOptions::default(),
            )
            .unwrap();

        let found = registry.get_request_form_definition(&Method::POST, "/contact", None);
        assert_eq!(found.unwrap().name, "contact");
    }

    #[test]
    fn test_no_match_on_wrong_method_or_path() {
        let registry = FormRegistry::new();
        registry
            .add_form(
                "contact",
                definition("contact", Method::POST, "/contact"),
                AddFormOptions::default(),
            )
            .unwrap();

        assert!(registry
            .get_request_form_definition(&Method::PUT, "/contact", None)
            .is_none());
        assert!(registry
            .get_request_form_definition(&Method::POST, "/other", None)
            .is_none());
    }

    #[test]
    fn test_get_requires_matching_form_id() {
        let registry = FormRegistry::new();
        registry
            .add_form(
                "search",
                definition("search", Method::GET, "/search"),
                AddFormOptions::default(),
            )
            .unwrap();

        assert!(registry
            .get_request_form_definition(&Method::GET, "/search", Some("search"))
            .is_some());
        assert!(registry
            .get_request_form_definition(&Method::GET, "/search", Some("other"))
            .is_none());
        assert!(registry
            .get_request_form_definition(&Method::GET, "/search", None)
            .is_none());
    }

    #[test]
    fn test_reregistration_overwrites() {
        let registry = FormRegistry::new();
        registry
            .add_form(
                "contact",
                definition("contact", Method::POST, "/contact"),
                AddFormOptions::default(),
            )
            .unwrap();
        registry
            .add_form(
                "contact",
                definition("contact", Method::POST, "/contact-v2"),
                AddFormOptions::default(),
            )
            .unwrap();

        assert_eq!(registry.len(), 1);
        assert!(registry
            .get_request_form_definition(&Method::POST, "/contact-v2", None)
            .is_some());
        assert!(registry
            .get_request_form_definition(&Method::POST, "/contact", None)
            .is_none());
    }

    #[test]
    fn test_is_random_recorded_from_options() {
        let registry = FormRegistry::new();
        registry
            .add_form(
                "once",
                definition("once", Method::POST, "/once"),
                AddFormOptions {
                    recreate: false,
                    is_random: true,
                },
            )
            .unwrap();

        let found = registry
            .get_request_form_definition(&Method::POST, "/once", None)
            .unwrap();
        assert!(found.is_random);
    }

    #[test]
    fn test_expired_definitions_evicted_on_next_add() {
        let registry = FormRegistry::with_timeout(Duration::ZERO);
        registry
            .add_form(
                "old",
                definition("old", Method::POST, "/old"),
                AddFormOptions::default(),
            )
            .unwrap();
        assert_eq!(registry.len(), 1);

        // Eviction happens only as a side effect of registration.
        registry
            .add_form(
                "new",
                definition("new", Method::POST, "/new"),
                AddFormOptions::default(),
            )
            .unwrap();

        assert!(!registry.contains("old"));
        assert!(registry.contains("new"));
    }

    #[test]
    fn test_entries_survive_until_cleanup_runs() {
        let registry = FormRegistry::with_timeout(Duration::ZERO);
        registry
            .add_form(
                "old",
                definition("old", Method::POST, "/old"),
                AddFormOptions::default(),
            )
            .unwrap();

        // Expired but not yet swept: still matchable.
        assert!(registry
            .get_request_form_definition(&Method::POST, "/old", None)
            .is_some());

        registry.clean_all_definitions();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_schema_compiles_into_validator_cache() {
        let registry = FormRegistry::new();
        let def = FormDefinition::builder("login")
            .method(Method::POST)
            .action("/login")
            .fields(FieldSchema::new().field("email", FieldSpec::new(FieldType::Email)))
            .build();
        registry
            .add_form("login", def, AddFormOptions::default())
            .unwrap();

        assert!(registry.validator("login").is_some());
        assert!(registry.validator("other").is_none());
    }

    #[test]
    fn test_schema_less_form_has_no_validator() {
        let registry = FormRegistry::new();
        registry
            .add_form(
                "plain",
                definition("plain", Method::POST, "/plain"),
                AddFormOptions::default(),
            )
            .unwrap();
        assert!(registry.validator("plain").is_none());
    }

    #[test]
    fn test_validator_survives_definition_eviction() {
        let registry = FormRegistry::with_timeout(Duration::ZERO);
        let def = FormDefinition::builder("login")
            .method(Method::POST)
            .action("/login")
            .fields(FieldSchema::new().field("email", FieldSpec::new(FieldType::Email)))
            .build();
        registry
            .add_form("login", def, AddFormOptions::default())
            .unwrap();

        registry.clean_all_definitions();
        assert!(!registry.contains("login"));
        // Stale until the next re-registration replaces it.
        assert!(registry.validator("login").is_some());
    }

    #[test]
    fn test_invalid_pattern_schema_errors_but_registers() {
        let registry = FormRegistry::new();
        let def = FormDefinition::builder("broken")
            .method(Method::POST)
            .action("/broken")
            .fields(FieldSchema::new().field(
                "code",
                FieldSpec::new(FieldType::Pattern {
                    regex: "[unclosed".to_string(),
                }),
            ))
            .build();

        let result = registry.add_form("broken", def, AddFormOptions::default());
        assert!(result.is_err());
        assert!(registry.contains("broken"));
        assert!(registry.validator("broken").is_none());
    }

    #[test]
    fn test_from_settings_clamps_to_minimum_timeout() {
        // A configured timeout of zero is clamped up to the minimum, so a
        // freshly added definition survives an immediate cleanup pass.
        let settings = Settings {
            form_cache_timeout: 0,
            ..Settings::default()
        };
        let registry = FormRegistry::from_settings(&settings);
        registry
            .add_form(
                "a",
                definition("a", Method::POST, "/a"),
                AddFormOptions::default(),
            )
            .unwrap();
        registry.clean_all_definitions();
        assert!(registry.contains("a"));
    }
}
