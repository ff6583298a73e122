use baccarat_engine::engine::{Engine, RoundResult};
use baccarat_engine::errors::EngineError;

/// Source of dealt rounds for the scheduler.
pub trait RoundResolver: Send {
    fn play_round(&mut self) -> Result<RoundResult, EngineError>;
}

impl RoundResolver for Engine {
    fn play_round(&mut self) -> Result<RoundResult, EngineError> {
        Engine::play_round(self)
    }
}

pub fn create_resolver(seed: Option<u64>) -> Box<dyn RoundResolver> {
    Box::new(Engine::new(seed))
}
