//! Resources of the `logging.banzaicloud.io` API group.

pub mod cluster_flow_v1beta1;
pub mod common;
pub mod syslog_ng_output_v1beta1;

pub use cluster_flow_v1beta1::{ClusterFlow, ClusterFlowSpec, ClusterFlowV1Beta1};
pub use syslog_ng_output_v1beta1::{SyslogNGOutput, SyslogNGOutputSpec, SyslogNgOutputV1Beta1};
