//! Log publishers.

use crate::schema::{AttributeDescriptor, Identity, ResourceSchema};

fn flag(name: &'static str, doc: &'static str) -> AttributeDescriptor {
    AttributeDescriptor::bool(name).optional_computed().doc(doc)
}

/// `file_based_audit_log_publisher`
#[must_use]
pub fn file_based_audit_log_publisher() -> ResourceSchema {
    ResourceSchema::new(
        "file_based_audit_log_publisher",
        "File Based Audit Log Publisher",
        "log-publishers",
        Identity::Single { attribute: "id" },
    )
    .describe("Manages a File Based Audit Log Publisher.")
    .urn("urn:pingidentity:schemas:configuration:2.0:log-publisher:file-based-audit")
    .with_default()
    .attributes(vec![
        flag("suppress_internal_operations", "Indicates whether internal operations should be excluded from the log."),
        AttributeDescriptor::string("log_file")
            .required()
            .doc("The file name to use for the log files generated by the File Based Audit Log Publisher."),
        AttributeDescriptor::string("log_file_permissions")
            .required()
            .doc("The UNIX permissions of the log files created by this File Based Audit Log Publisher."),
        AttributeDescriptor::set("rotation_policy")
            .required()
            .doc("The rotation policy to use for the File Based Audit Log Publisher."),
        AttributeDescriptor::set("rotation_listener")
            .optional_computed()
            .doc("A listener that should be notified whenever a log file is rotated out of service."),
        AttributeDescriptor::set("retention_policy")
            .required()
            .doc("The retention policy to use for the File Based Audit Log Publisher."),
        AttributeDescriptor::string("compression_mechanism")
            .optional_computed()
            .one_of(&["none", "gzip", "gzip-with-integrity"])
            .doc("Specifies the type of compression (if any) to use for log files that are written."),
        flag("sign_log", "Indicates whether the log should be cryptographically signed."),
        flag("encrypt_log", "Indicates whether log files should be encrypted."),
        AttributeDescriptor::string("encryption_settings_definition_id")
            .json_name("encryptionSettingsDefinitionID")
            .doc("Specifies the ID of the encryption settings definition to use to encrypt the data."),
        flag("append", "Specifies whether to append to existing log files."),
        flag("include_product_name", "Indicates whether log messages should include the product name."),
        flag("include_instance_name", "Indicates whether log messages should include the instance name."),
        flag("include_startup_id", "Indicates whether log messages should include the startup ID.")
            .json_name("includeStartupID"),
        flag("include_thread_id", "Indicates whether log messages should include the thread ID.")
            .json_name("includeThreadID"),
        flag("include_requester_ip_address", "Indicates whether log messages should include the IP address of the requester.")
            .json_name("includeRequesterIPAddress"),
        flag("include_requester_dn", "Indicates whether log messages should include the DN of the authenticated user.")
            .json_name("includeRequesterDN"),
        flag("include_replication_change_id", "Indicates whether to log information about the replication change ID.")
            .json_name("includeReplicationChangeID"),
        flag("use_reversible_form", "Indicates whether the audit log should be written in reversible form."),
        AttributeDescriptor::string("soft_delete_entry_audit_behavior")
            .optional_computed()
            .one_of(&["commit", "ignore"])
            .doc("Specifies the audit behavior for delete and modify operations on soft-deleted entries."),
        flag("include_request_controls", "Indicates whether log messages for operation requests should include a list of the OIDs of any controls included in the request."),
        flag("include_operation_purpose_request_control", "Indicates whether to include information about any operation purpose request control."),
        flag("include_intermediate_client_request_control", "Indicates whether to include information about any intermediate client request control."),
        AttributeDescriptor::set("obscure_attribute")
            .optional_computed()
            .doc("Attribute types whose values should be obscured in the audit log."),
        AttributeDescriptor::set("exclude_attribute")
            .optional_computed()
            .doc("Attribute types that should be excluded from the audit log."),
        AttributeDescriptor::bool("asynchronous")
            .required()
            .doc("Indicates whether the File Based Audit Log Publisher will publish records asynchronously."),
        flag("auto_flush", "Specifies whether to flush the writer after every log record."),
        AttributeDescriptor::string("buffer_size")
            .optional_computed()
            .formatted()
            .doc("Specifies the log file buffer size."),
        AttributeDescriptor::int("queue_size")
            .optional_computed()
            .doc("The maximum number of log records that can be stored in the asynchronous queue."),
        AttributeDescriptor::string("time_interval")
            .optional_computed()
            .formatted()
            .doc("Specifies the interval at which to check whether the log files need to be rotated."),
        AttributeDescriptor::string("timestamp_precision")
            .optional_computed()
            .one_of(&["seconds", "milliseconds"])
            .doc("Specifies the smallest time unit to be included in timestamps."),
        flag("log_security_negotiation", "Indicates whether to log information about the result of any security negotiation."),
        flag("log_intermediate_responses", "Indicates whether to log information about intermediate responses sent to the client."),
        flag("suppress_replication_operations", "Indicates whether access messages generated by replication should be suppressed."),
        AttributeDescriptor::string("connection_criteria")
            .doc("Specifies a set of connection criteria that must match the associated client connection."),
        AttributeDescriptor::string("request_criteria")
            .doc("Specifies a set of request criteria that must match the associated operation request."),
        AttributeDescriptor::string("result_criteria")
            .doc("Specifies a set of result criteria that must match the associated operation result."),
        AttributeDescriptor::string("description")
            .doc("A description for this Log Publisher"),
        AttributeDescriptor::bool("enabled")
            .required()
            .doc("Indicates whether the Log Publisher is enabled for use."),
        AttributeDescriptor::string("logging_error_behavior")
            .optional_computed()
            .one_of(&["standard-error", "lose-messages"])
            .doc("Specifies the behavior that the server should exhibit if an error occurs during logging processing."),
    ])
}
