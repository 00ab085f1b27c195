//! NETCONF payload builders and reply parsing.

use quick_xml::Reader;
use quick_xml::events::Event;

use crate::device::LoopbackInterface;
use crate::error::NetconfError;

const NETCONF_BASE: &str = "urn:ietf:params:xml:ns:netconf:base:1.0";
const IETF_INTERFACES: &str = "urn:ietf:params:xml:ns:yang:ietf-interfaces";
const IETF_IP: &str = "urn:ietf:params:xml:ns:yang:ietf-ip";
const IANA_IF_TYPE: &str = "urn:ietf:params:xml:ns:yang:iana-if-type";

/// Subtree filter selecting the loopback in the configuration plane.
pub fn config_filter(name: &str) -> String {
    format!(
        r#"<filter type="subtree"><interfaces xmlns="{IETF_INTERFACES}"><interface><name>{name}</name></interface></interfaces></filter>"#
    )
}

/// Subtree filter selecting the loopback in the state plane.
pub fn state_filter(name: &str) -> String {
    format!(
        r#"<filter type="subtree"><interfaces-state xmlns="{IETF_INTERFACES}"><interface><name>{name}</name></interface></interfaces-state></filter>"#
    )
}

/// `<config>` creating the loopback with its address. `operation="create"`
/// makes the router refuse it with `data-exists` if the loopback is there.
pub fn create_config(iface: &LoopbackInterface) -> String {
    format!(
        concat!(
            r#"<config xmlns:nc="{base}"><interfaces xmlns="{ns}"><interface nc:operation="create">"#,
            "<name>{name}</name>",
            "<description>{description}</description>",
            r#"<type xmlns:ianaift="{iana}">ianaift:softwareLoopback</type>"#,
            "<enabled>true</enabled>",
            r#"<ipv4 xmlns="{ip_ns}"><address><ip>{ip}</ip><netmask>{mask}</netmask></address></ipv4>"#,
            "</interface></interfaces></config>"
        ),
        base = NETCONF_BASE,
        ns = IETF_INTERFACES,
        name = iface.config_name(),
        description = iface.description(),
        iana = IANA_IF_TYPE,
        ip_ns = IETF_IP,
        ip = iface.ipv4_address(),
        mask = iface.netmask(),
    )
}

/// `<config>` removing the loopback.
pub fn delete_config(name: &str) -> String {
    format!(
        r#"<config xmlns:nc="{NETCONF_BASE}"><interfaces xmlns="{IETF_INTERFACES}"><interface nc:operation="delete"><name>{name}</name></interface></interfaces></config>"#
    )
}

/// `<config>` setting the loopback admin state.
pub fn enabled_config(name: &str, enabled: bool) -> String {
    format!(
        r#"<config><interfaces xmlns="{IETF_INTERFACES}"><interface><name>{name}</name><enabled>{enabled}</enabled></interface></interfaces></config>"#
    )
}

/// A parsed `<rpc-reply>`.
///
/// Elements are addressed by their slash-joined local-name path from the
/// document root, e.g. `rpc-reply/data/interfaces/interface/enabled`.
#[derive(Debug, Default)]
pub struct RpcReply {
    ok: bool,
    errors: Vec<String>,
    error_tags: Vec<String>,
    elements: Vec<String>,
    leaves: Vec<(String, String)>,
}

impl RpcReply {
    /// Parse one framed message. Anything but an `<rpc-reply>` document is
    /// an error.
    pub fn parse(xml: &str) -> Result<Self, NetconfError> {
        let mut reader = Reader::from_str(xml);
        let mut buf = Vec::new();
        let mut stack: Vec<String> = Vec::new();
        let mut reply = Self::default();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(ref e) => {
                    stack.push(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
                    reply.record_element(&stack);
                }
                Event::Empty(ref e) => {
                    stack.push(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
                    reply.record_element(&stack);
                    stack.pop();
                }
                Event::Text(ref t) => {
                    let text = String::from_utf8_lossy(t).trim().to_string();
                    if !text.is_empty() {
                        reply.record_text(&stack, text);
                    }
                }
                Event::End(_) => {
                    stack.pop();
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        if reply.elements.first().map(String::as_str) != Some("rpc-reply") {
            return Err(NetconfError::Xml("document is not an rpc-reply".to_string()));
        }

        Ok(reply)
    }

    fn record_element(&mut self, stack: &[String]) {
        let path = stack.join("/");
        if path == "rpc-reply/ok" {
            self.ok = true;
        }
        self.elements.push(path);
    }

    fn record_text(&mut self, stack: &[String], text: String) {
        match stack.last().map(String::as_str) {
            Some("error-message") => self.errors.push(text.clone()),
            Some("error-tag") => self.error_tags.push(text.clone()),
            _ => {}
        }
        self.leaves.push((stack.join("/"), text));
    }

    /// `<ok/>` present and no `<rpc-error>`.
    pub fn is_ok(&self) -> bool {
        self.ok && !self.has_errors()
    }

    /// At least one `<rpc-error>` is present.
    pub fn has_errors(&self) -> bool {
        self.elements.iter().any(|p| p == "rpc-reply/rpc-error")
    }

    /// Error messages from every `<rpc-error>`.
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Whether any `<rpc-error>` carries this `<error-tag>`.
    pub fn has_error_tag(&self, tag: &str) -> bool {
        self.error_tags.iter().any(|t| t == tag)
    }

    /// Whether an element with this path exists.
    pub fn contains(&self, path: &str) -> bool {
        self.elements.iter().any(|p| p == path)
    }

    /// Text of the first element with this path.
    pub fn text(&self, path: &str) -> Option<&str> {
        self.leaves
            .iter()
            .find(|(p, _)| p == path)
            .map(|(_, text)| text.as_str())
    }
}
