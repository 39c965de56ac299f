use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::config::{load_project_config, OutputLayout, RepogenConfig};
use crate::discovery::{discover_models, read_source_roots, Candidate, Discovery, ModelDescriptor};
use crate::generator::naming::{
    base_interface_path, base_repository_path, resolve_target, GenerationTarget,
};
use crate::generator::publish::{FilePublisher, PublishOutcome};
use crate::generator::templates::{TemplateContext, TemplateId, TemplateStore};
use crate::generator::wiring::WiringManifest;

/// Options for a generation run.
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// Explicit `repogen.toml`; auto-detected at the project root when `None`
    pub config_path: Option<PathBuf>,
    /// Render everything but write nothing
    pub dry_run: bool,
}

/// Progress of a run. A failed run reports the last stage it completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStage {
    /// Nothing written yet; discovery runs here
    Init,
    /// Output directories exist
    DirectoriesEnsured,
    /// Shared base interface and repository published
    BasesPublished,
    /// Number of models whose files have been published so far
    ModelsProcessed(usize),
    /// Provider rewritten
    WiringPublished,
    /// Run finished
    Done,
    /// A fatal error stopped the run
    Failed,
}

impl fmt::Display for RunStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStage::Init => f.write_str("init"),
            RunStage::DirectoriesEnsured => f.write_str("directories ensured"),
            RunStage::BasesPublished => f.write_str("bases published"),
            RunStage::ModelsProcessed(n) => write!(f, "models processed ({n})"),
            RunStage::WiringPublished => f.write_str("wiring published"),
            RunStage::Done => f.write_str("done"),
            RunStage::Failed => f.write_str("failed"),
        }
    }
}

/// Outcome for one target path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedFile {
    /// Target path
    pub path: PathBuf,
    /// What the publisher did there
    pub outcome: PublishOutcome,
}

/// An eligible model and the files generated for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedModel {
    /// The eligible model
    pub model: ModelDescriptor,
    /// Its interface and repository names and paths
    pub target: GenerationTarget,
}

/// Everything a run did, in the order it did it.
#[derive(Debug, Clone, Default)]
pub struct GenerationReport {
    /// Eligible models in discovery order
    pub models: Vec<GeneratedModel>,
    /// Resolved types that got no repository, with their eligibility verdict
    pub skipped: Vec<ModelDescriptor>,
    /// Candidate files that do not declare the type their path names
    pub unresolved: Vec<Candidate>,
    /// Base and per-model files
    pub files: Vec<PublishedFile>,
    /// The wiring provider
    pub wiring: Option<PublishedFile>,
}

impl GenerationReport {
    /// Outcome recorded for `path`, including the wiring file.
    pub fn outcome(&self, path: &Path) -> Option<PublishOutcome> {
        self.files
            .iter()
            .chain(self.wiring.as_ref())
            .find(|f| f.path == path)
            .map(|f| f.outcome)
    }

    /// Number of files that reached the disk.
    pub fn written(&self) -> usize {
        self.files
            .iter()
            .chain(self.wiring.as_ref())
            .filter(|f| f.outcome.wrote())
            .count()
    }
}

/// Drives discovery and publishing for one project.
#[derive(Debug)]
pub struct RepositoryGenerator {
    config: RepogenConfig,
    layout: OutputLayout,
    templates: TemplateStore,
    publisher: FilePublisher,
    stage: RunStage,
}

impl RepositoryGenerator {
    /// Generator over `project_root` with an already loaded configuration.
    pub fn new(project_root: &Path, config: RepogenConfig, dry_run: bool) -> Self {
        let layout = OutputLayout::new(project_root, &config);
        let templates = match &config.stubs_dir {
            Some(dir) => TemplateStore::with_overrides(project_root.join(dir)),
            None => TemplateStore::builtin(),
        };
        let publisher = if dry_run {
            FilePublisher::dry_run()
        } else {
            FilePublisher::new()
        };
        RepositoryGenerator {
            config,
            layout,
            templates,
            publisher,
            stage: RunStage::Init,
        }
    }

    /// Load the project's configuration and build a generator.
    pub fn from_project(project_root: &Path, options: &GenerateOptions) -> anyhow::Result<Self> {
        let config = load_project_config(project_root, options.config_path.as_deref())
            .with_context(|| format!("Failed to load configuration for {project_root:?}"))?;
        Ok(Self::new(project_root, config, options.dry_run))
    }

    pub fn layout(&self) -> &OutputLayout {
        &self.layout
    }

    pub fn config(&self) -> &RepogenConfig {
        &self.config
    }

    pub fn stage(&self) -> RunStage {
        self.stage
    }

    /// Read the source roots and classify every candidate under them.
    pub fn discover(&self) -> anyhow::Result<Discovery> {
        let manifest = self.layout.project_root.join(&self.config.manifest);
        let roots = read_source_roots(&manifest, &self.layout.project_root)?;
        tracing::debug!(roots = roots.len(), manifest = %manifest.display(), "source roots loaded");
        Ok(discover_models(&roots, &self.config)?)
    }

    /// Full run: discovery, bases, per-model files, wiring.
    ///
    /// Files published before a failure stay on disk.
    pub fn run(&mut self) -> anyhow::Result<GenerationReport> {
        match self.run_stages() {
            Ok(report) => Ok(report),
            Err(err) => {
                let reached = std::mem::replace(&mut self.stage, RunStage::Failed);
                Err(err.context(format!(
                    "Repository generation failed after stage `{reached}`"
                )))
            }
        }
    }

    fn run_stages(&mut self) -> anyhow::Result<GenerationReport> {
        let discovery = self.discover()?;
        let mut report = GenerationReport {
            skipped: discovery.skipped().cloned().collect(),
            unresolved: discovery.unresolved.clone(),
            ..GenerationReport::default()
        };
        for model in discovery.skipped().filter(|m| m.eligibility.is_skipped_model()) {
            println!("ℹ️  {} -> ignored ({})", model.fqn, model.eligibility);
        }

        self.ensure_directories()?;
        report.files.extend(self.publish_bases()?);

        let mut claimed: HashMap<String, &str> = HashMap::new();
        let mut wiring = WiringManifest::new();
        for model in discovery.models() {
            if let Some(first) = claimed.insert(model.short_name.to_ascii_lowercase(), &model.fqn) {
                tracing::warn!(model = %model.fqn, other = %first, "models share a short name; the provider will import the same class twice");
                println!(
                    "⚠️  {} -> shares repository names with {first}; {} will not load until one model is renamed",
                    model.fqn,
                    self.layout.provider_class()
                );
            }
            let (target, files) = self.publish_model(model)?;
            wiring.push(&target);
            report.files.extend(files);
            report.models.push(GeneratedModel {
                model: model.clone(),
                target,
            });
        }

        let provider = self.publish_wiring(&wiring)?;
        println!("✅ {} -> {}", self.layout.provider_class(), describe(provider.outcome));
        report.wiring = Some(provider);
        self.stage = RunStage::Done;

        println!(
            "🎉 Repositories ready for {} model(s), {} file(s) written",
            report.models.len(),
            report.written()
        );
        Ok(report)
    }

    /// Create the interface, repository and provider directories.
    pub fn ensure_directories(&mut self) -> anyhow::Result<()> {
        let provider_dir = self.layout.provider_path.parent().map(Path::to_path_buf);
        for dir in [&self.layout.interfaces_dir, &self.layout.repositories_dir]
            .into_iter()
            .chain(provider_dir.as_ref())
        {
            self.publisher.ensure_dir(dir)?;
        }
        self.stage = RunStage::DirectoriesEnsured;
        Ok(())
    }

    /// Publish the shared base interface and base repository once.
    pub fn publish_bases(&mut self) -> anyhow::Result<Vec<PublishedFile>> {
        let interface_ctx =
            TemplateContext::new().with("CLASS_NAMESPACE", &self.layout.interfaces_namespace);
        let repository_ctx = TemplateContext::new()
            .with("CLASS_NAMESPACE", &self.layout.repositories_namespace)
            .with("INTERFACE_NAMESPACE", &self.layout.interfaces_namespace);

        let files = vec![
            self.publish(
                TemplateId::BaseInterface,
                &interface_ctx,
                base_interface_path(&self.layout),
            )?,
            self.publish(
                TemplateId::BaseRepository,
                &repository_ctx,
                base_repository_path(&self.layout),
            )?,
        ];
        self.stage = RunStage::BasesPublished;
        Ok(files)
    }

    /// Publish the interface and repository of one eligible model.
    pub fn publish_model(
        &mut self,
        model: &ModelDescriptor,
    ) -> anyhow::Result<(GenerationTarget, Vec<PublishedFile>)> {
        let target = resolve_target(model, &self.layout);
        let interface_ctx = TemplateContext::new()
            .with("CLASS_NAMESPACE", &self.layout.interfaces_namespace)
            .with("MODEL_NAMESPACE", &model.fqn)
            .with("INTERFACE", &target.interface_name)
            .with("MODEL", &model.short_name);
        let repository_ctx = TemplateContext::new()
            .with("CLASS_NAMESPACE", &self.layout.repositories_namespace)
            .with("INTERFACE_NAMESPACE", &target.interface_fqn)
            .with("MODEL_NAMESPACE", &model.fqn)
            .with("CLASS", &target.repository_name)
            .with("INTERFACE", &target.interface_name)
            .with("MODEL", &model.short_name);

        let files = vec![
            self.publish(
                TemplateId::ModelInterface,
                &interface_ctx,
                target.interface_path.clone(),
            )?,
            self.publish(
                TemplateId::ModelRepository,
                &repository_ctx,
                target.repository_path.clone(),
            )?,
        ];
        println!("✅ {} -> repository and interface", model.fqn);

        let done = match self.stage {
            RunStage::ModelsProcessed(n) => n + 1,
            _ => 1,
        };
        self.stage = RunStage::ModelsProcessed(done);
        Ok((target, files))
    }

    /// Delete and rewrite the wiring provider from the accumulated manifest.
    pub fn publish_wiring(&mut self, wiring: &WiringManifest) -> anyhow::Result<PublishedFile> {
        let content = self
            .templates
            .render_id(TemplateId::Provider, &wiring.context(&self.layout.provider_namespace))?;
        let path = self.layout.provider_path.clone();
        let outcome = self
            .publisher
            .replace(&path, &content)
            .with_context(|| format!("Failed to write wiring provider {path:?}"))?;
        tracing::info!(path = %path.display(), bindings = wiring.len(), ?outcome, "wiring provider published");
        self.stage = RunStage::WiringPublished;
        Ok(PublishedFile { path, outcome })
    }

    fn publish(
        &self,
        id: TemplateId,
        ctx: &TemplateContext,
        path: PathBuf,
    ) -> anyhow::Result<PublishedFile> {
        let content = self.templates.render_id(id, ctx)?;
        let outcome = self.publisher.publish_once(&path, &content)?;
        match outcome {
            PublishOutcome::AlreadyExists => println!("⚠️  Skipping existing file: {path:?}"),
            PublishOutcome::DryRun => println!("📝 Would write {path:?}"),
            _ => tracing::debug!(path = %path.display(), template = %id, "published"),
        }
        Ok(PublishedFile { path, outcome })
    }
}

fn describe(outcome: PublishOutcome) -> &'static str {
    match outcome {
        PublishOutcome::DryRun => "would be rewritten",
        _ => "success",
    }
}

/// Run generation for the project at `project_root`.
pub fn generate_repositories(
    project_root: &Path,
    options: &GenerateOptions,
) -> anyhow::Result<GenerationReport> {
    RepositoryGenerator::from_project(project_root, options)?.run()
}
