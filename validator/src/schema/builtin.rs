use super::{FieldKind, FieldSpec, Schema, SchemaProvider};
use crate::error::SchemaError;

use FieldKind as K;

const VERSIONS: [&str; 2] = ["2.5", "2.6"];

/// OpenRTB 2.5 and 2.6 bid-request shapes, built in memory.
#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinSchemaProvider;

impl BuiltinSchemaProvider {
  pub fn new() -> Self {
    Self
  }
}

impl SchemaProvider for BuiltinSchemaProvider {
  fn load(&self, version: &str) -> Result<Schema, SchemaError> {
    let fields = match version {
      "2.5" => openrtb_25_fields(),
      "2.6" => {
        let mut fields = openrtb_25_fields();
        fields.extend(openrtb_26_additions());
        fields
      }
      other => {
        return Err(SchemaError::UnsupportedVersion {
          version: other.to_string(),
          available: VERSIONS.join(", "),
        })
      }
    };
    tracing::debug!(version, fields = fields.len(), "built schema");
    Schema::new(version, fields)
  }

  fn versions(&self) -> Vec<String> {
    VERSIONS.iter().map(|v| v.to_string()).collect()
  }
}

fn f(path: &str, kind: FieldKind) -> FieldSpec {
  FieldSpec::new(path, kind)
}

fn openrtb_25_fields() -> Vec<FieldSpec> {
  vec![
    // Top level
    f("id", K::String).required(),
    f("imp", K::Array).required().min_items(1).strict(),
    f("at", K::Integer),
    f("tmax", K::Integer).range(Some(0.0), None),
    f("test", K::Integer),
    f("allimps", K::Integer),
    f("cur", K::StringArray),
    f("wseat", K::StringArray),
    f("bseat", K::StringArray),
    f("bcat", K::StringArray),
    f("badv", K::StringArray),
    f("bapp", K::StringArray),
    // Impressions
    f("imp.*", K::Object),
    f("imp.*.id", K::String).required(),
    f("imp.*.tagid", K::String),
    f("imp.*.bidfloor", K::Number),
    f("imp.*.bidfloorcur", K::String),
    f("imp.*.instl", K::Integer),
    f("imp.*.secure", K::Integer),
    f("imp.*.exp", K::Integer).range(Some(0.0), None),
    f("imp.*.banner", K::Object),
    f("imp.*.banner.w", K::Integer),
    f("imp.*.banner.h", K::Integer),
    f("imp.*.banner.wmin", K::Integer),
    f("imp.*.banner.wmax", K::Integer),
    f("imp.*.banner.hmin", K::Integer),
    f("imp.*.banner.hmax", K::Integer),
    f("imp.*.banner.pos", K::Integer),
    f("imp.*.banner.btype", K::IntegerArray),
    f("imp.*.banner.battr", K::IntegerArray),
    f("imp.*.banner.mimes", K::StringArray),
    f("imp.*.banner.format", K::Array).min_items(1),
    f("imp.*.banner.format.*", K::Object),
    f("imp.*.banner.format.*.w", K::Integer),
    f("imp.*.banner.format.*.h", K::Integer),
    f("imp.*.video", K::Object),
    f("imp.*.video.mimes", K::StringArray).required().min_items(1),
    f("imp.*.video.minduration", K::Integer).range(Some(0.0), None),
    f("imp.*.video.maxduration", K::Integer).range(Some(0.0), None),
    f("imp.*.video.protocols", K::IntegerArray),
    f("imp.*.video.w", K::Integer),
    f("imp.*.video.h", K::Integer),
    f("imp.*.video.startdelay", K::Integer),
    f("imp.*.video.placement", K::Integer).range(Some(1.0), Some(5.0)),
    f("imp.*.video.linearity", K::Integer).range(Some(1.0), Some(2.0)),
    f("imp.*.video.skip", K::Integer),
    f("imp.*.video.minbitrate", K::Integer),
    f("imp.*.video.maxbitrate", K::Integer),
    f("imp.*.audio", K::Object),
    f("imp.*.audio.mimes", K::StringArray).required().min_items(1),
    f("imp.*.audio.minduration", K::Integer).range(Some(0.0), None),
    f("imp.*.audio.maxduration", K::Integer).range(Some(0.0), None),
    f("imp.*.native", K::Object),
    f("imp.*.native.request", K::String).required(),
    f("imp.*.native.ver", K::String),
    f("imp.*.pmp", K::Object),
    f("imp.*.pmp.private_auction", K::Integer),
    f("imp.*.pmp.deals", K::Array),
    f("imp.*.pmp.deals.*.id", K::String).required(),
    f("imp.*.pmp.deals.*.bidfloor", K::Number),
    // Distribution channel
    f("site", K::Object),
    f("site.id", K::String),
    f("site.name", K::String),
    f("site.domain", K::String),
    f("site.page", K::String),
    f("site.ref", K::String),
    f("site.cat", K::StringArray),
    f("site.publisher", K::Object),
    f("site.publisher.id", K::String),
    f("app", K::Object),
    f("app.id", K::String),
    f("app.name", K::String),
    f("app.bundle", K::String),
    f("app.storeurl", K::String),
    f("app.cat", K::StringArray),
    f("app.publisher", K::Object),
    f("app.publisher.id", K::String),
    // Device and user
    f("device", K::Object),
    f("device.ua", K::String),
    f("device.ip", K::String),
    f("device.ipv6", K::String),
    f("device.devicetype", K::Integer),
    f("device.connectiontype", K::Integer),
    f("device.make", K::String),
    f("device.model", K::String),
    f("device.os", K::String),
    f("device.osv", K::String),
    f("device.w", K::Integer),
    f("device.h", K::Integer),
    f("device.language", K::String),
    f("device.ifa", K::String),
    f("device.dnt", K::Integer),
    f("device.lmt", K::Integer),
    f("device.js", K::Integer),
    f("device.geo", K::Object),
    f("device.geo.lat", K::Number).range(Some(-90.0), Some(90.0)),
    f("device.geo.lon", K::Number).range(Some(-180.0), Some(180.0)),
    f("device.geo.country", K::String),
    f("device.geo.type", K::Integer),
    f("user", K::Object),
    f("user.id", K::String),
    f("user.buyeruid", K::String),
    f("user.yob", K::Integer),
    f("user.gender", K::String),
    f("user.keywords", K::String),
    f("user.data", K::Array),
    // Regulations and source
    f("regs", K::Object),
    f("regs.coppa", K::Integer),
    f("regs.ext", K::Object),
    f("source", K::Object),
    f("source.tid", K::String),
    f("source.fd", K::Integer),
    f("source.pchain", K::String),
  ]
}

fn openrtb_26_additions() -> Vec<FieldSpec> {
  vec![
    f("cattax", K::Integer),
    f("wlang", K::StringArray),
    f("acat", K::StringArray),
    f("imp.*.rwdd", K::Integer),
    f("imp.*.ssai", K::Integer).range(Some(0.0), Some(3.0)),
    f("imp.*.qty", K::Object),
    f("imp.*.video.plcmt", K::Integer).range(Some(1.0), Some(4.0)),
    f("imp.*.video.podid", K::String),
    f("imp.*.video.maxseq", K::Integer),
    f("imp.*.video.poddur", K::Integer),
    f("device.sua", K::Object),
    f("device.sua.mobile", K::Integer),
    f("user.eids", K::Array),
    f("user.eids.*.source", K::String).required(),
    f("user.eids.*.uids", K::Array).required().min_items(1),
    f("regs.gdpr", K::Integer),
    f("regs.us_privacy", K::String),
    f("regs.gpp", K::String),
    f("regs.gpp_sid", K::IntegerArray),
    f("source.schain", K::Object),
    f("source.schain.complete", K::Integer),
    f("source.schain.ver", K::String).required(),
    f("source.schain.nodes", K::Array).required(),
  ]
}
