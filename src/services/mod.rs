pub mod api;
pub mod delegation;
pub mod explorer;
pub mod near_rpc;
pub mod node_deploy;
pub mod rewards;
pub mod staking_limits;
