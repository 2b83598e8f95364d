use std::collections::BTreeMap;

use http::HeaderMap;
use http::header::{ACCEPT, HeaderValue, USER_AGENT};

use crate::request::{ParamValue, RequestDescriptor};
use crate::util::{parse_header_name, parse_header_value};

/// A header parameter serialized in `simple` style: arrays become a
/// comma-separated list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeaderParam {
    pub name: &'static str,
    pub value: ParamValue,
}

impl HeaderParam {
    pub fn new(name: &'static str, value: impl Into<ParamValue>) -> Self {
        Self {
            name,
            value: value.into(),
        }
    }
}

/// Maps one field of `T` onto a header name.
pub struct HeaderBinding<T> {
    pub name: &'static str,
    pub accessor: fn(&T) -> Option<ParamValue>,
}

impl<T> HeaderBinding<T> {
    pub fn collect(bindings: &[HeaderBinding<T>], source: &T) -> Vec<HeaderParam> {
        bindings
            .iter()
            .filter_map(|binding| {
                (binding.accessor)(source).map(|value| HeaderParam {
                    name: binding.name,
                    value,
                })
            })
            .collect()
    }
}

/// Device and client identification sent with every Plex request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Globals {
    pub accepts: Option<String>,
    pub client_identifier: Option<String>,
    pub product: Option<String>,
    pub version: Option<String>,
    pub platform: Option<String>,
    pub platform_version: Option<String>,
    pub device: Option<String>,
    pub model: Option<String>,
    pub device_vendor: Option<String>,
    pub device_name: Option<String>,
    pub marketplace: Option<String>,
}

pub const DEFAULT_ACCEPTS: &str = "application/json";

fn field(value: &Option<String>) -> Option<ParamValue> {
    value.clone().map(ParamValue::Single)
}

pub(crate) const GLOBAL_HEADER_BINDINGS: &[HeaderBinding<Globals>] = &[
    HeaderBinding {
        name: "accepts",
        accessor: |globals| {
            Some(ParamValue::Single(
                globals
                    .accepts
                    .clone()
                    .unwrap_or_else(|| DEFAULT_ACCEPTS.to_owned()),
            ))
        },
    },
    HeaderBinding {
        name: "X-Plex-Client-Identifier",
        accessor: |globals| field(&globals.client_identifier),
    },
    HeaderBinding {
        name: "X-Plex-Product",
        accessor: |globals| field(&globals.product),
    },
    HeaderBinding {
        name: "X-Plex-Version",
        accessor: |globals| field(&globals.version),
    },
    HeaderBinding {
        name: "X-Plex-Platform",
        accessor: |globals| field(&globals.platform),
    },
    HeaderBinding {
        name: "X-Plex-Platform-Version",
        accessor: |globals| field(&globals.platform_version),
    },
    HeaderBinding {
        name: "X-Plex-Device",
        accessor: |globals| field(&globals.device),
    },
    HeaderBinding {
        name: "X-Plex-Model",
        accessor: |globals| field(&globals.model),
    },
    HeaderBinding {
        name: "X-Plex-Device-Vendor",
        accessor: |globals| field(&globals.device_vendor),
    },
    HeaderBinding {
        name: "X-Plex-Device-Name",
        accessor: |globals| field(&globals.device_name),
    },
    HeaderBinding {
        name: "X-Plex-Marketplace",
        accessor: |globals| field(&globals.marketplace),
    },
];

impl Globals {
    pub fn header_params(&self) -> Vec<HeaderParam> {
        HeaderBinding::collect(GLOBAL_HEADER_BINDINGS, self)
    }
}

/// Applies headers in precedence order: defaults, globals, operation
/// parameters, then caller overrides. Later writes replace earlier ones.
pub(crate) struct HeaderPopulator<'a> {
    pub(crate) accept: &'static str,
    pub(crate) user_agent: &'a str,
    pub(crate) globals: &'a Globals,
    pub(crate) operation_params: Vec<HeaderParam>,
    pub(crate) overrides: &'a HeaderMap,
}

impl HeaderPopulator<'_> {
    pub(crate) fn apply(self, descriptor: &mut RequestDescriptor) -> crate::Result<()> {
        let headers = descriptor.headers_mut();
        headers.insert(ACCEPT, HeaderValue::from_static(self.accept));
        headers.insert(
            USER_AGENT,
            parse_header_value(USER_AGENT.as_str(), self.user_agent)?,
        );

        let global_params = self.globals.header_params();
        let operation_names: Vec<String> = self
            .operation_params
            .iter()
            .map(|param| param.name.to_ascii_lowercase())
            .collect();
        let inherited = global_params
            .iter()
            .filter(|param| !operation_names.contains(&param.name.to_ascii_lowercase()));
        for param in inherited.chain(self.operation_params.iter()) {
            insert_param(headers, param)?;
        }

        apply_overrides(headers, self.overrides);
        Ok(())
    }
}

/// Parses per-call `set_header` values into a map applied after every other
/// header source, credentials included.
pub(crate) fn parse_overrides(overrides: &BTreeMap<String, String>) -> crate::Result<HeaderMap> {
    let mut parsed = HeaderMap::with_capacity(overrides.len());
    for (name, value) in overrides {
        let name = parse_header_name(name)?;
        let value = parse_header_value(name.as_str(), value)?;
        parsed.insert(name, value);
    }
    Ok(parsed)
}

pub(crate) fn apply_overrides(headers: &mut HeaderMap, overrides: &HeaderMap) {
    for (name, value) in overrides {
        headers.insert(name.clone(), value.clone());
    }
}

fn insert_param(headers: &mut HeaderMap, param: &HeaderParam) -> crate::Result<()> {
    let name = parse_header_name(param.name)?;
    let value = parse_header_value(param.name, &param.value.join(","))?;
    headers.insert(name, value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use http::Method;

    use super::{Globals, HeaderParam, HeaderPopulator, parse_overrides};
    use crate::request::{ParamValue, RequestDescriptor};

    fn header<'a>(descriptor: &'a RequestDescriptor, name: &str) -> Option<&'a str> {
        descriptor
            .headers()
            .get(name)
            .and_then(|value| value.to_str().ok())
    }

    #[test]
    fn globals_default_accepts_and_skip_unset_fields() {
        let globals = Globals {
            client_identifier: Some("abc".to_owned()),
            ..Globals::default()
        };
        let params = globals.header_params();

        assert_eq!(params.len(), 2);
        assert_eq!(params[0], HeaderParam::new("accepts", "application/json"));
        assert_eq!(params[1], HeaderParam::new("X-Plex-Client-Identifier", "abc"));
    }

    #[test]
    fn populator_applies_precedence_order() {
        let globals = Globals {
            product: Some("Plex Web".to_owned()),
            device: Some("Linux".to_owned()),
            ..Globals::default()
        };
        let mut overrides = BTreeMap::new();
        overrides.insert("x-plex-device".to_owned(), "Override".to_owned());
        let overrides = parse_overrides(&overrides).expect("overrides parse");
        let mut descriptor = RequestDescriptor::new(Method::GET, "https://plex.tv/api/v2");

        HeaderPopulator {
            accept: "application/json",
            user_agent: "plexapi-test",
            globals: &globals,
            operation_params: vec![
                HeaderParam::new("X-Plex-Product", "Custom"),
                HeaderParam::new(
                    "X-Plex-Tags",
                    ParamValue::List(vec!["a".to_owned(), "b".to_owned()]),
                ),
            ],
            overrides: &overrides,
        }
        .apply(&mut descriptor)
        .expect("headers apply");

        assert_eq!(header(&descriptor, "accept"), Some("application/json"));
        assert_eq!(header(&descriptor, "user-agent"), Some("plexapi-test"));
        assert_eq!(header(&descriptor, "X-Plex-Product"), Some("Custom"));
        assert_eq!(header(&descriptor, "x-plex-tags"), Some("a,b"));
        assert_eq!(header(&descriptor, "X-Plex-Device"), Some("Override"));
        assert_eq!(descriptor.headers().get_all("x-plex-device").iter().count(), 1);
    }
}
