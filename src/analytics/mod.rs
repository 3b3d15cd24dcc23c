//! Run history: every analysis attempt is appended to a JSONL log that
//! `topiclens history` reads back.

pub mod logger;
