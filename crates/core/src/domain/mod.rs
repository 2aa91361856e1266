pub mod answers;
pub mod assessment;
pub mod contract;
pub mod security;
