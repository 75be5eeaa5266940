#![forbid(unsafe_code)]

//! Typed views of a parsed `samlp:Response`.
//!
//! Projection is lenient: anything optional in the protocol is an
//! `Option`, and deciding whether an absent value is acceptable is left to
//! validation. Only a root that is not a `Response` is rejected here.

use std::collections::BTreeMap;

use lidingo_core::{ns, Error};
use lidingo_xml::{path, Document, Element};

use crate::ASSERTION_PATH;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub id: Option<String>,
    pub in_response_to: Option<String>,
    pub destination: Option<String>,
    pub issuer: Option<String>,
    pub assertion: Option<Assertion>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assertion {
    pub id: Option<String>,
    pub issuer: Option<String>,
    pub subject: Option<Subject>,
    pub conditions: Option<Conditions>,
    pub session_not_on_or_after: Option<String>,
    /// Attribute name to its values, in document order.
    pub attributes: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject {
    pub name_id: String,
    pub format: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conditions {
    pub not_before: Option<String>,
    pub not_on_or_after: Option<String>,
    pub audiences: Vec<String>,
}

impl Response {
    pub fn from_document(doc: &Document) -> Result<Self, Error> {
        let root = &doc.root;
        if !root.name.is(ns::SAMLP, ns::node::RESPONSE) {
            return Err(Error::MissingElement(ns::node::RESPONSE.into()));
        }
        Ok(Self {
            id: attr(root, ns::attr::ID),
            in_response_to: attr(root, ns::attr::IN_RESPONSE_TO),
            destination: attr(root, ns::attr::DESTINATION),
            issuer: root.child(ns::SAML, ns::node::ISSUER).map(|i| i.text().trim().to_owned()),
            // The same element the signature check covers
            assertion: path::find_first(&ASSERTION_PATH, root).map(Assertion::from_element),
        })
    }
}

impl Assertion {
    fn from_element(el: &Element) -> Self {
        let subject = el
            .child(ns::SAML, ns::node::SUBJECT)
            .and_then(|s| s.child(ns::SAML, ns::node::NAME_ID))
            .map(|name_id| Subject {
                name_id: name_id.text().trim().to_owned(),
                format: attr(name_id, "Format"),
            });
        let conditions = el.child(ns::SAML, ns::node::CONDITIONS).map(|c| Conditions {
            not_before: attr(c, ns::attr::NOT_BEFORE),
            not_on_or_after: attr(c, ns::attr::NOT_ON_OR_AFTER),
            audiences: c
                .children_named(ns::SAML, ns::node::AUDIENCE_RESTRICTION)
                .flat_map(|r| r.children_named(ns::SAML, ns::node::AUDIENCE))
                .map(|a| a.text().trim().to_owned())
                .collect(),
        });
        let session_not_on_or_after = el
            .children_named(ns::SAML, ns::node::AUTHN_STATEMENT)
            .find_map(|s| attr(s, ns::attr::SESSION_NOT_ON_OR_AFTER));

        let mut attributes: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for statement in el.children_named(ns::SAML, ns::node::ATTRIBUTE_STATEMENT) {
            for attribute in statement.children_named(ns::SAML, ns::node::ATTRIBUTE) {
                let Some(name) = attribute.attr(ns::attr::NAME) else {
                    continue;
                };
                attributes.entry(name.to_owned()).or_default().extend(
                    attribute
                        .children_named(ns::SAML, ns::node::ATTRIBUTE_VALUE)
                        .map(Element::text),
                );
            }
        }

        Self {
            id: attr(el, ns::attr::ID),
            issuer: el.child(ns::SAML, ns::node::ISSUER).map(|i| i.text().trim().to_owned()),
            subject,
            conditions,
            session_not_on_or_after,
            attributes,
        }
    }
}

fn attr(el: &Element, name: &str) -> Option<String> {
    el.attr(name).map(str::to_owned)
}
