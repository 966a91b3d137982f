//! External servers.

use crate::schema::{AttributeDescriptor, Identity, ResourceSchema};

/// LDAP result codes that can mark a connection as defunct.
const DEFUNCT_RESULT_CODES: &[&str] = &[
    "operations-error",
    "protocol-error",
    "time-limit-exceeded",
    "size-limit-exceeded",
    "compare-false",
    "compare-true",
    "auth-method-not-supported",
    "strong-auth-required",
    "referral",
    "admin-limit-exceeded",
    "unavailable-critical-extension",
    "confidentiality-required",
    "sasl-bind-in-progress",
    "no-such-attribute",
    "undefined-attribute-type",
    "inappropriate-matching",
    "constraint-violation",
    "attribute-or-value-exists",
    "invalid-attribute-syntax",
    "no-such-object",
    "alias-problem",
    "invalid-dn-syntax",
    "alias-dereferencing-problem",
    "inappropriate-authentication",
    "invalid-credentials",
    "insufficient-access-rights",
    "busy",
    "unavailable",
    "unwilling-to-perform",
    "loop-detect",
    "sort-control-missing",
    "offset-range-error",
    "naming-violation",
    "object-class-violation",
    "not-allowed-on-nonleaf",
    "not-allowed-on-rdn",
    "entry-already-exists",
    "object-class-mods-prohibited",
    "affects-multiple-dsas",
    "virtual-list-view-error",
    "other",
    "server-down",
    "local-error",
    "encoding-error",
    "decoding-error",
    "timeout",
    "auth-unknown",
    "filter-error",
    "user-canceled",
    "param-error",
    "no-memory",
    "connect-error",
    "not-supported",
    "control-not-found",
    "no-results-returned",
    "more-results-to-return",
    "client-loop",
    "referral-limit-exceeded",
    "canceled",
    "no-such-operation",
    "too-late",
    "cannot-cancel",
    "assertion-failed",
    "authorization-denied",
    "e-sync-refresh-required",
    "no-operation",
    "interactive-transaction-aborted",
    "database-lock-conflict",
    "mirrored-subtree-digest-mismatch",
    "token-delivery-mechanism-unavailable",
    "token-delivery-attempt-failed",
    "token-delivery-invalid-recipient-id",
    "token-delivery-invalid-account-state",
];

/// `ping_identity_ds_external_server`
#[must_use]
pub fn ping_identity_ds_external_server() -> ResourceSchema {
    ResourceSchema::new(
        "ping_identity_ds_external_server",
        "Ping Identity Ds External Server",
        "external-servers",
        Identity::Single { attribute: "id" },
    )
    .describe("Manages a Ping Identity Ds External Server.")
    .urn("urn:pingidentity:schemas:configuration:2.0:external-server:ping-identity-ds")
    .with_default()
    .attributes(vec![
        AttributeDescriptor::string("verify_credentials_method")
            .optional_computed()
            .one_of(&[
                "separate-connections",
                "bind-on-existing-connections",
                "retain-identity-control",
            ])
            .doc("The mechanism to use to verify user credentials while ensuring that the ability to process other operations is not impacted by an alternate authorization identity."),
        AttributeDescriptor::bool("use_administrative_operation_control")
            .optional_computed()
            .doc("Indicates whether to include the administrative operation request control in requests intended for administrative operations."),
        AttributeDescriptor::string("server_host_name")
            .required()
            .doc("The host name or IP address of the target LDAP server."),
        AttributeDescriptor::int("server_port")
            .optional_computed()
            .doc("The port number on which the server listens for requests."),
        AttributeDescriptor::string("location")
            .doc("Specifies the location for the LDAP External Server."),
        AttributeDescriptor::string("bind_dn")
            .json_name("bindDN")
            .doc("The DN to use to bind to the target LDAP server if simple authentication is required."),
        AttributeDescriptor::string("password")
            .write_only()
            .doc("The login password for the specified user."),
        AttributeDescriptor::string("passphrase_provider")
            .doc("The passphrase provider to use to obtain the login password for the specified user."),
        AttributeDescriptor::string("connection_security")
            .optional_computed()
            .one_of(&["none", "ssl", "start-tls"])
            .doc("The mechanism to use to secure communication with the directory server."),
        AttributeDescriptor::string("authentication_method")
            .optional_computed()
            .one_of(&["none", "simple", "external"])
            .doc("The mechanism to use to authenticate to the target server."),
        AttributeDescriptor::string("health_check_connect_timeout")
            .optional_computed()
            .formatted()
            .doc("Maximum length of time to wait for a health check connection to be established."),
        AttributeDescriptor::string("max_connection_age")
            .optional_computed()
            .formatted()
            .doc("Maximum length of time that connections to this server should remain established before being replaced."),
        AttributeDescriptor::string("min_expired_connection_disconnect_interval")
            .optional_computed()
            .formatted()
            .doc("Minimum length of time between connection closures caused by the maximum connection age."),
        AttributeDescriptor::string("connect_timeout")
            .optional_computed()
            .formatted()
            .doc("Maximum length of time to wait for a connection to be established before considering the server unavailable."),
        AttributeDescriptor::string("max_response_size")
            .optional_computed()
            .formatted()
            .doc("Maximum response size supported for messages received from the LDAP external server."),
        AttributeDescriptor::string("key_manager_provider")
            .doc("The key manager provider to use if SSL or StartTLS is used for connection-level security."),
        AttributeDescriptor::string("trust_manager_provider")
            .doc("The trust manager provider to use if SSL or StartTLS is used for connection-level security."),
        AttributeDescriptor::int("initial_connections")
            .optional_computed()
            .doc("The number of connections to initially establish to the LDAP external server."),
        AttributeDescriptor::int("max_connections")
            .optional_computed()
            .doc("The maximum number of concurrent connections to maintain for the LDAP external server."),
        AttributeDescriptor::set("defunct_connection_result_code")
            .optional_computed()
            .one_of(DEFUNCT_RESULT_CODES)
            .doc("Operation result codes that cause the associated connection to be considered defunct."),
        AttributeDescriptor::bool("abandon_on_timeout")
            .optional_computed()
            .doc("Indicates whether to send an abandon request for an operation that timed out."),
        AttributeDescriptor::string("description")
            .doc("A description for this External Server"),
    ])
}

/// `ping_one_http_external_server`
#[must_use]
pub fn ping_one_http_external_server() -> ResourceSchema {
    ResourceSchema::new(
        "ping_one_http_external_server",
        "Ping One Http External Server",
        "external-servers",
        Identity::Single { attribute: "id" },
    )
    .describe("Manages a Ping One Http External Server.")
    .urn("urn:pingidentity:schemas:configuration:2.0:external-server:ping-one-http")
    .with_default()
    .attributes(vec![
        AttributeDescriptor::string("hostname_verification_method")
            .optional_computed()
            .one_of(&["strict", "allow-all"])
            .doc("The mechanism for checking if the hostname of the PingOne Server matches the name(s) stored inside the X.509 certificate presented by the PingOne Server."),
        AttributeDescriptor::string("trust_manager_provider")
            .optional_computed()
            .doc("The trust manager provider to use for HTTPS connection-level security."),
        AttributeDescriptor::string("connect_timeout")
            .optional_computed()
            .formatted()
            .doc("Specifies the maximum length of time to wait for a connection to be established before aborting a request to PingOne."),
        AttributeDescriptor::string("response_timeout")
            .optional_computed()
            .formatted()
            .doc("Specifies the maximum length of time to wait for response data to be read from an established connection before aborting a request to PingOne."),
        AttributeDescriptor::string("description")
            .doc("A description for this External Server"),
    ])
}
