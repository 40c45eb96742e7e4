//! The agent loop and answer streaming for Tribuna.
//!
//! The agent follows a bounded **Plan → Act → Observe** cycle:
//!
//! 1. **Build context**: persona prompt + caller-supplied history + new input
//! 2. **Plan**: send to the planner LLM with the tool definitions
//! 3. **Act**: if the planner chose a tool, execute it (one call per step)
//! 4. **Observe**: append the tool output and loop back to step 2
//! 5. **Finish**: a text-only answer ends the loop
//!
//! The loop also ends when the planner breaks the output format (recovered
//! by [`recovery::recover_final_answer`]) or when the iteration cap is hit.
//! [`ChatStreamer`] then replays the final answer word by word as
//! [`StreamEvent`]s.

pub mod persona;
pub mod react;
pub mod recovery;
pub mod stream_event;
pub mod streamer;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use persona::Persona;
pub use react::{ITERATION_LIMIT_MESSAGE, ReactAgent, ReactResult, StopReason};
pub use recovery::{FALLBACK_MESSAGE, recover_final_answer};
pub use stream_event::StreamEvent;
pub use streamer::{ChatStreamer, segment_words};
