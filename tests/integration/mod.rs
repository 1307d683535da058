//! Integration tests driving the relay binary end to end

mod helpers;
mod test_flags;
mod test_init;
mod test_pipeline;
mod test_plan;
