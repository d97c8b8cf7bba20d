pub mod budget;
pub mod grants;
pub mod prereq;
pub mod series;

pub use budget::{PowerLimitMatrix, DEFAULT_POWER_LIMIT};
pub use grants::{
    can_select_power, effective_granted_powers, granted_entities, origin_consumed_powers,
    DenyReason, Grant, GrantedBy, SelectionVerdict,
};
pub use prereq::{
    evaluate, parse_clauses, required_rank, ClauseParseError, PrereqContext, PrereqOutcome,
    RequirementClause,
};
pub use series::{collapse_series, series_base, series_number};
