mod common;
mod jobs;
