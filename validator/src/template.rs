//! Reusable request skeletons and generation of concrete requests from them.

use crate::error::TemplateError;
use crate::path::apply_overrides;

use std::fmt;
use std::sync::Arc;

use ahash::{HashMap, HashMapExt};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// A named, versioned skeleton request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
  pub id: String,
  pub name: String,
  pub version: String,
  #[serde(default)]
  pub description: String,
  pub request: Value,
}

/// A concrete request produced from a template and a set of overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedRequest {
  pub template_id: String,
  pub template_version: String,
  pub request: Value,
  /// Override paths in the order they were applied.
  pub applied_overrides: Vec<String>,
  pub generated_at: DateTime<Utc>,
  pub from_cache: bool,
}

impl GeneratedRequest {
  /// Applies `overrides` (dotted path to value) to a copy of the template's
  /// request. The template is left untouched.
  pub fn generate(template: &Template, overrides: &Map<String, Value>) -> Result<Self, TemplateError> {
    let request = apply_overrides(&template.request, overrides)
      .map_err(|(path, source)| TemplateError::InvalidOverride { path, source })?;
    Ok(Self {
      template_id: template.id.clone(),
      template_version: template.version.clone(),
      request,
      applied_overrides: overrides.keys().cloned().collect(),
      generated_at: Utc::now(),
      from_cache: false,
    })
  }
}

/// The source of templates. Catalog management lives outside the validator.
pub trait TemplateCatalog: Send + Sync + fmt::Debug {
  fn get(&self, id: &str) -> Option<Arc<Template>>;

  fn ids(&self) -> Vec<String>;
}

/// A thread-safe in-memory catalog.
#[derive(Debug, Default)]
pub struct InMemoryTemplateCatalog {
  templates: RwLock<HashMap<String, Arc<Template>>>,
}

impl InMemoryTemplateCatalog {
  pub fn new() -> Self {
    Self {
      templates: RwLock::new(HashMap::new()),
    }
  }

  /// A catalog preloaded with the built-in templates.
  pub fn with_builtins() -> Self {
    let catalog = Self::new();
    for template in builtin_templates() {
      catalog.insert(template);
    }
    catalog
  }

  /// Adds or replaces a template. Returns the previous one with that id.
  pub fn insert(&self, template: Template) -> Option<Arc<Template>> {
    self.templates.write().insert(template.id.clone(), Arc::new(template))
  }

  pub fn remove(&self, id: &str) -> Option<Arc<Template>> {
    self.templates.write().remove(id)
  }

  pub fn len(&self) -> usize {
    self.templates.read().len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

impl TemplateCatalog for InMemoryTemplateCatalog {
  fn get(&self, id: &str) -> Option<Arc<Template>> {
    self.templates.read().get(id).cloned()
  }

  fn ids(&self) -> Vec<String> {
    let mut ids: Vec<String> = self.templates.read().keys().cloned().collect();
    ids.sort();
    ids
  }
}

fn template(id: &str, name: &str, description: &str, request: Value) -> Template {
  Template {
    id: id.to_string(),
    name: name.to_string(),
    version: "1.0.0".to_string(),
    description: description.to_string(),
    request,
  }
}

/// `banner-basic`, `video-instream`, `mobile-app-banner` and `native-feed`.
pub fn builtin_templates() -> Vec<Template> {
  vec![
    template(
      "banner-basic",
      "Basic Banner",
      "A single 300x250 display impression on a desktop site.",
      json!({
        "id": "banner-request-1",
        "imp": [{
          "id": "1",
          "banner": {"w": 300, "h": 250, "pos": 1, "format": [{"w": 300, "h": 250}, {"w": 336, "h": 280}]},
          "bidfloor": 0.5,
          "bidfloorcur": "USD",
          "secure": 1
        }],
        "site": {
          "id": "site-123",
          "name": "Example News",
          "domain": "news.example.com",
          "page": "https://news.example.com/article",
          "cat": ["IAB12"],
          "publisher": {"id": "pub-1"}
        },
        "device": {
          "ua": "Mozilla/5.0 (Windows NT 10.0; Win64; x64)",
          "ip": "203.0.113.10",
          "devicetype": 2,
          "connectiontype": 2,
          "language": "en"
        },
        "user": {"id": "user-abc"},
        "at": 2,
        "tmax": 300,
        "cur": ["USD"]
      }),
    ),
    template(
      "video-instream",
      "In-stream Video",
      "A pre-roll video impression between 5 and 30 seconds.",
      json!({
        "id": "video-request-1",
        "imp": [{
          "id": "1",
          "video": {
            "mimes": ["video/mp4", "video/webm"],
            "minduration": 5,
            "maxduration": 30,
            "protocols": [2, 3, 5, 6],
            "w": 640,
            "h": 360,
            "startdelay": 0,
            "placement": 1,
            "linearity": 1
          },
          "bidfloor": 2.0,
          "bidfloorcur": "USD"
        }],
        "site": {"id": "site-456", "domain": "video.example.com", "page": "https://video.example.com/watch"},
        "device": {"ua": "Mozilla/5.0", "ip": "203.0.113.20", "devicetype": 2},
        "at": 2,
        "tmax": 500,
        "cur": ["USD"]
      }),
    ),
    template(
      "mobile-app-banner",
      "Mobile App Banner",
      "A 320x50 banner inside a mobile application.",
      json!({
        "id": "app-request-1",
        "imp": [{
          "id": "1",
          "banner": {"w": 320, "h": 50, "pos": 3},
          "instl": 0,
          "bidfloor": 0.25,
          "bidfloorcur": "USD"
        }],
        "app": {
          "id": "app-789",
          "name": "Example Game",
          "bundle": "com.example.game",
          "storeurl": "https://apps.example.com/game",
          "publisher": {"id": "pub-2"}
        },
        "device": {
          "ua": "Mozilla/5.0 (Linux; Android 14)",
          "ip": "203.0.113.30",
          "devicetype": 4,
          "connectiontype": 6,
          "os": "Android",
          "ifa": "00000000-0000-0000-0000-000000000000",
          "lmt": 0
        },
        "at": 1,
        "tmax": 250,
        "cur": ["USD"]
      }),
    ),
    template(
      "native-feed",
      "Native In-feed",
      "A native ad placed in a content feed.",
      json!({
        "id": "native-request-1",
        "imp": [{
          "id": "1",
          "native": {
            "request": "{\"ver\":\"1.2\",\"plcmttype\":1,\"assets\":[{\"id\":1,\"required\":1,\"title\":{\"len\":90}}]}",
            "ver": "1.2"
          },
          "bidfloor": 1.0,
          "bidfloorcur": "USD"
        }],
        "site": {"id": "site-321", "domain": "feed.example.com", "page": "https://feed.example.com/"},
        "device": {"ua": "Mozilla/5.0", "ip": "203.0.113.40", "devicetype": 1},
        "at": 2,
        "tmax": 400,
        "cur": ["USD"]
      }),
    ),
  ]
}
