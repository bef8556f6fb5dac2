pub mod allocator;
pub mod conflict_detector;
pub mod planner_service;
pub mod preview_assembler;
pub mod schedule_utils;
pub mod suggestion_generator;
