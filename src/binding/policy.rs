use std::fmt;

pub const GZIP_ENCODING_NAME: &str = "GZipEncoding";
pub const GZIP_ENCODING_NAMESPACE: &str = "http://schemas.microsoft.com/ws/06/2004/mspolicy/netgzip1";
pub const GZIP_ENCODING_PREFIX: &str = "gzip";

/// An empty, namespace-qualified policy assertion element
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct PolicyAssertion {
    prefix: &'static str,
    local_name: &'static str,
    namespace: &'static str,
}

impl PolicyAssertion {
    pub fn gzip_encoding() -> PolicyAssertion {
        PolicyAssertion {
            prefix: GZIP_ENCODING_PREFIX,
            local_name: GZIP_ENCODING_NAME,
            namespace: GZIP_ENCODING_NAMESPACE,
        }
    }

    pub fn prefix(&self) -> &str {
        self.prefix
    }

    pub fn local_name(&self) -> &str {
        self.local_name
    }

    pub fn namespace(&self) -> &str {
        self.namespace
    }

    pub fn to_xml(&self) -> String {
        format!(
            "<{0}:{1} xmlns:{0}=\"{2}\"/>",
            self.prefix, self.local_name, self.namespace
        )
    }
}

impl fmt::Display for PolicyAssertion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_xml())
    }
}
