use crate::{Error, Record, RecordName, Result};
use roxmltree::Document;

/// Extension namespace declared on the root element of the XML section.
///
/// Elements and point attributes of an extension carry the namespace prefix
/// in their qualified XML name, for example `nor:normalX`.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub struct Extension {
    /// XML namespace prefix.
    pub namespace: String,
    /// XML namespace URI.
    pub url: String,
}

impl Extension {
    pub(crate) fn vec_from_document(document: &Document) -> Vec<Extension> {
        document
            .root_element()
            .namespaces()
            .filter_map(|ns| {
                ns.name().map(|prefix| Extension {
                    namespace: prefix.to_string(),
                    url: ns.uri().to_string(),
                })
            })
            .collect()
    }

    /// Searches the URI declared for a namespace prefix.
    pub fn find<'a>(extensions: &'a [Extension], namespace: &str) -> Option<&'a Extension> {
        extensions.iter().find(|e| e.namespace == namespace)
    }

    /// Checks that all extension attributes of a point prototype use a declared namespace.
    pub(crate) fn validate(path: &str, records: &[Record], extensions: &[Extension]) -> Result<()> {
        for record in records {
            if let RecordName::Unknown { namespace, name } = &record.name {
                if Self::find(extensions, namespace).is_none() {
                    Error::mismatch(
                        &format!("{path}/{namespace}:{name}"),
                        "declared extension namespace",
                        namespace,
                    )?
                }
            }
        }
        Ok(())
    }
}
