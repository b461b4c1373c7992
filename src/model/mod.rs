pub mod config;
pub mod datasets;
pub mod diagram;
pub mod layout;
pub mod performance;
pub mod reconcile;
pub mod topic_info;
pub mod topic_tree;
pub mod transition;
