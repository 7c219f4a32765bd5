//! Connectivity metrics pipeline: normalize, filter, aggregate.

mod buckets;
mod filter;
mod funnel;
mod normalize;
mod stages;

pub use buckets::{bucket_distribution, BucketCount};
pub use filter::{campaigns, filter_campaign};
pub use funnel::{
    connectivity_rate, distinct_leads, first_attempt, format_rate, second_attempt,
    FirstAttemptMetrics, FunnelMetrics, RecoveryMetrics,
};
pub use normalize::{
    attempt_bucket, normalize, title_case, DialerRecord, LeadId, Outcome, CONNECT, NON_CONNECT,
    THIRD_PLUS_BUCKET,
};
pub use stages::{run_pipeline, ConnectivityReport, Dataset};
