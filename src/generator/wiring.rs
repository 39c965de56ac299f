use super::naming::GenerationTarget;
use super::templates::TemplateContext;

/// Indentation of binding entries inside the provider's `$bindings` array.
const BINDING_INDENT: &str = "        ";

/// Statements accumulated for the wiring provider, one triple per model in
/// discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WiringManifest {
    /// `use` lines for repository implementations
    pub repository_imports: Vec<String>,
    /// `use` lines for interfaces
    pub interface_imports: Vec<String>,
    /// `Interface::class => Repository::class,` entries
    pub bindings: Vec<String>,
}

impl WiringManifest {
    /// Empty manifest.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the statements for one model.
    pub fn push(&mut self, target: &GenerationTarget) {
        self.repository_imports
            .push(format!("use {};", target.repository_fqn));
        self.interface_imports
            .push(format!("use {};", target.interface_fqn));
        self.bindings.push(format!(
            "{}::class => {}::class,",
            target.interface_name, target.repository_name
        ));
    }

    /// Number of bindings.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Whether no model was pushed.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Placeholder values for the provider template.
    pub fn context(&self, provider_namespace: &str) -> TemplateContext {
        TemplateContext::new()
            .with("CLASS_NAMESPACE", provider_namespace)
            .with("REPOSITORIES_NAMESPACES", self.repository_imports.join("\n"))
            .with("INTERFACES_NAMESPACES", self.interface_imports.join("\n"))
            .with("BINDS", self.bindings.join(&format!("\n{BINDING_INDENT}")))
    }
}

impl<'a> Extend<&'a GenerationTarget> for WiringManifest {
    fn extend<I: IntoIterator<Item = &'a GenerationTarget>>(&mut self, iter: I) {
        for target in iter {
            self.push(target);
        }
    }
}
