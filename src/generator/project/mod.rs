mod generate;

pub use generate::{
    generate_repositories, GenerateOptions, GeneratedModel, GenerationReport, PublishedFile,
    RepositoryGenerator, RunStage,
};
