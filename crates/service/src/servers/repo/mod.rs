pub mod seaorm;

pub use seaorm::SeaOrmServerRepository;
