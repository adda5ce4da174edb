use thiserror::Error;

/// Fatal problems with the day's puzzle. Both fail closed: no game is started.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PuzzleError {
    #[error("puzzle list is empty")]
    InvalidPuzzleSet,
    #[error("puzzle #{index} is malformed: {reason}")]
    MalformedPuzzle { index: usize, reason: String },
}

#[derive(Debug, Error)]
pub enum GameError {
    #[error(transparent)]
    Puzzle(#[from] PuzzleError),
    #[error("no puzzle loaded")]
    NoPuzzleLoaded,
    #[error("this round is over")]
    RoundOver,
}
