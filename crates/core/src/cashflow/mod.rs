pub mod cashflow_model;
pub mod cashflow_service;

pub use cashflow_model::{CashFlowEvent, FlowKind, FlowScope, MissingDataPoint};
pub use cashflow_service::CashFlowBuilder;
