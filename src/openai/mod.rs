mod core;

pub use self::core::{
    Completion, CompletionRequest, Message, Role, Usage, completion, completion_stream,
};
