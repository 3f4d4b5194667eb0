//! DNS resolver seam and its hickory-resolver implementation.

use std::future::Future;
use std::sync::Arc;

use hickory_resolver::error::{ResolveError, ResolveErrorKind};
use hickory_resolver::proto::op::ResponseCode;
use hickory_resolver::proto::rr::{RData, RecordType as WireType};
use hickory_resolver::TokioAsyncResolver;
use log::debug;

use super::types::RecordType;
use crate::error_handling::ResolutionError;

/// Issues a single DNS query.
///
/// Implementations return `Ok(vec![])` when the name exists but has no records of
/// the requested type, and `Err(ResolutionError::NxDomain)` when the name does not
/// exist at all. Timeouts and retries are applied by
/// [`ResolverAdapter`](super::ResolverAdapter), not here.
pub trait DnsResolver: Clone + Send + Sync + 'static {
    fn query(
        &self,
        name: &str,
        record_type: RecordType,
    ) -> impl Future<Output = Result<Vec<String>, ResolutionError>> + Send;
}

/// Production resolver backed by `hickory-resolver`.
#[derive(Clone)]
pub struct HickoryResolver {
    resolver: Arc<TokioAsyncResolver>,
}

impl HickoryResolver {
    /// Wraps an already configured hickory resolver.
    pub fn new(resolver: Arc<TokioAsyncResolver>) -> Self {
        Self { resolver }
    }
}

impl DnsResolver for HickoryResolver {
    async fn query(
        &self,
        name: &str,
        record_type: RecordType,
    ) -> Result<Vec<String>, ResolutionError> {
        // Fully qualified so search domains are never appended
        let fqdn = if name.ends_with('.') {
            name.to_string()
        } else {
            format!("{name}.")
        };
        let wire_type = to_wire_type(record_type);

        match self.resolver.lookup(fqdn.as_str(), wire_type).await {
            Ok(lookup) => {
                let values: Vec<String> = lookup
                    .iter()
                    .filter(|rdata| rdata.record_type() == wire_type)
                    .filter_map(render_rdata)
                    .collect();
                debug!("{record_type} {name}: {} record(s)", values.len());
                Ok(values)
            }
            Err(e) => classify_error(name, &e),
        }
    }
}

fn to_wire_type(record_type: RecordType) -> WireType {
    match record_type {
        RecordType::Txt => WireType::TXT,
        RecordType::Mx => WireType::MX,
        RecordType::Cname => WireType::CNAME,
        RecordType::A => WireType::A,
        RecordType::Aaaa => WireType::AAAA,
    }
}

/// Renders record data in the raw string forms described on [`RawRecordSet`](super::RawRecordSet).
fn render_rdata(rdata: &RData) -> Option<String> {
    match rdata {
        // TXT records can contain multiple character-strings - join them
        RData::TXT(txt) => Some(
            txt.iter()
                .map(|bytes| String::from_utf8_lossy(bytes).to_string())
                .collect::<Vec<String>>()
                .join(""),
        ),
        RData::MX(mx) => Some(format!("{} {}", mx.preference(), mx.exchange().to_utf8())),
        RData::CNAME(target) => Some(target.0.to_utf8()),
        RData::A(addr) => Some(addr.0.to_string()),
        RData::AAAA(addr) => Some(addr.0.to_string()),
        _ => None,
    }
}

/// Maps a hickory error onto the resolution taxonomy.
///
/// NOERROR with an empty answer ("no records found") is not an error.
fn classify_error(name: &str, e: &ResolveError) -> Result<Vec<String>, ResolutionError> {
    let name = name.to_string();
    match e.kind() {
        ResolveErrorKind::NoRecordsFound { response_code, .. } => match *response_code {
            ResponseCode::NoError => Ok(Vec::new()),
            ResponseCode::NXDomain => Err(ResolutionError::NxDomain { name }),
            ResponseCode::ServFail => Err(ResolutionError::ServFail { name }),
            other => Err(ResolutionError::Transport {
                name,
                reason: format!("server answered {other}"),
            }),
        },
        ResolveErrorKind::Timeout => Err(ResolutionError::Timeout { name }),
        ResolveErrorKind::NoConnections => Err(ResolutionError::Transport {
            name,
            reason: "no nameservers reachable".to_string(),
        }),
        ResolveErrorKind::Io(_) => Err(ResolutionError::Transport {
            name,
            reason: "network error".to_string(),
        }),
        _ => {
            // Proto errors carry timeouts as text
            let error_msg = e.to_string().to_lowercase();
            if error_msg.contains("timed out") || error_msg.contains("timeout") {
                Err(ResolutionError::Timeout { name })
            } else if error_msg.contains("servfail") {
                Err(ResolutionError::ServFail { name })
            } else {
                Err(ResolutionError::Transport {
                    name,
                    reason: "protocol error".to_string(),
                })
            }
        }
    }
}
