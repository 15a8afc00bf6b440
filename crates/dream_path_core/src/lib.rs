pub mod decode;
pub mod domain;
pub mod error;
pub mod game;
pub mod history;
pub mod imagery;
pub mod normalize;
pub mod notebooks;
pub mod orchestrator;
pub mod ports;
pub mod prompt;

pub use decode::{DecodeError, DecodePolicy};
pub use domain::{
    FlashCard, GamePair, GenerationMode, GenerationRequest, GenerationResult, HistoryItem,
    LearnerProfile, NewNotebook, Notebook, NotebookId, NotebookUpdate, QuizQuestion, User,
    UserCredentials, UserMetadata,
};
pub use error::GenerationError;
pub use game::{CardSide, GameCard, MatchingGame, Selection};
pub use history::FileHistory;
pub use imagery::{AugmentStrategy, SearchImageLookup};
pub use normalize::{ContentNormalizer, SourceKind};
pub use notebooks::NotebookLibrary;
pub use orchestrator::{GenerationState, Orchestrator, OrchestratorSettings};
pub use ports::{
    AccountStore, CompletionService, HistoryStore, ImageLookupService, NotebookStore,
    PageExtractor, PortError, PortResult,
};
