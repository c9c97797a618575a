//! Diagnostic codes and message templates.

use super::{DiagnosticCategory, DiagnosticMessage};

pub mod diagnostic_codes {
    // Types and declarations
    pub const TYPE_NOT_FOUND: u32 = 1001;
    pub const PARTIAL_KIND_MISMATCH: u32 = 1002;
    pub const MISSING_PARTIAL_MODIFIER: u32 = 1003;
    pub const PARTIAL_BASE_MISMATCH: u32 = 1004;
    pub const BASE_NOT_CLASS: u32 = 1005;
    pub const BASE_NOT_ALLOWED: u32 = 1006;
    pub const CIRCULAR_BASE: u32 = 1007;
    pub const INTERFACE_EXPECTED: u32 = 1008;
    pub const DUPLICATE_INTERFACE: u32 = 1009;
    pub const DUPLICATE_TYPE: u32 = 1010;
    pub const GENERIC_ARITY_MISMATCH: u32 = 1011;
    pub const TYPE_NOT_ACCESSIBLE: u32 = 1012;
    pub const BASE_CLASS_SEALED: u32 = 1013;

    // Member table
    pub const DUPLICATE_MEMBER_NAME: u32 = 1101;
    pub const OVERLOAD_DIFFERS_ONLY_BY_REF_KIND: u32 = 1102;
    pub const DUPLICATE_SIGNATURE: u32 = 1103;
    pub const INCONSISTENT_INDEXER_NAMES: u32 = 1104;
    pub const OPERATOR_REQUIRES_MATCHING: u32 = 1105;
    pub const ACCESSOR_NAME_RESERVED: u32 = 1106;
    pub const MEMBER_NAME_SAME_AS_TYPE: u32 = 1107;
    pub const INTERFACE_CANNOT_CONTAIN_FIELDS: u32 = 1108;
    pub const INTERFACE_CANNOT_CONTAIN_CONSTRUCTORS: u32 = 1109;

    // Partial members
    pub const PARTIAL_DUPLICATE_DEFINITION: u32 = 1201;
    pub const PARTIAL_DUPLICATE_IMPLEMENTATION: u32 = 1202;
    pub const PARTIAL_MISSING_IMPLEMENTATION: u32 = 1203;
    pub const PARTIAL_MISSING_DEFINITION: u32 = 1204;
    pub const PARTIAL_RETURN_TYPE_MISMATCH: u32 = 1205;
    pub const PARTIAL_STATIC_MISMATCH: u32 = 1206;
    pub const PARTIAL_ACCESSIBILITY_MISMATCH: u32 = 1207;
    pub const PARTIAL_PARAMETER_NAME_DIFFERS: u32 = 1208;
    pub const PARTIAL_MISSING_ACCESSOR: u32 = 1209;
    pub const PARTIAL_UNEXPECTED_ACCESSOR: u32 = 1210;
    pub const PARTIAL_NOT_ALLOWED: u32 = 1211;

    // Struct layout
    pub const STRUCT_LAYOUT_CYCLE: u32 = 1301;

    // Annotations, constants and forwarders
    pub const ANNOTATION_NOT_FOUND: u32 = 1401;
    pub const ANNOTATION_INVALID_TARGET: u32 = 1402;
    pub const DUPLICATE_ANNOTATION: u32 = 1403;
    pub const ANNOTATION_ARGUMENT_COUNT: u32 = 1404;
    pub const ANNOTATION_ARGUMENT_TYPE: u32 = 1405;
    pub const INVALID_VERSION: u32 = 1406;
    pub const INVALID_PUBLIC_KEY: u32 = 1407;
    pub const INVALID_GRANT: u32 = 1408;
    pub const GRANT_MISSING_KEY: u32 = 1409;
    pub const CONSTANT_CYCLE: u32 = 1410;
    pub const CONSTANT_NOT_FOUND: u32 = 1411;
    pub const FORWARDER_CONFLICTS_WITH_SOURCE: u32 = 1412;
    pub const FORWARDER_TARGET_NOT_FOUND: u32 = 1413;
    pub const FORWARDER_CYCLE: u32 = 1414;
    pub const DEFAULT_MEMBER_WITH_INDEXER: u32 = 1415;
    pub const INDEXER_NAME_INVALID: u32 = 1416;
    pub const CONDITIONAL_REQUIRES_VOID: u32 = 1417;
    pub const DUPLICATE_FORWARDER: u32 = 1418;
    pub const RESOLUTION_LIMIT_EXCEEDED: u32 = 1419;

    // Grants
    pub const GRANT_KEY_MISMATCH: u32 = 1501;
    pub const GRANT_SIGNING_MISMATCH: u32 = 1502;

    // Field usage
    pub const FIELD_NEVER_USED: u32 = 1601;
    pub const FIELD_NEVER_ASSIGNED: u32 = 1602;
    pub const FIELD_ASSIGNED_NEVER_READ: u32 = 1603;
}

pub mod diagnostic_messages {
    pub const TYPE_NOT_FOUND: &str = "The type or namespace name '{0}' could not be found.";
    pub const PARTIAL_KIND_MISMATCH: &str =
        "Partial declarations of '{0}' must be all classes, all structs, or all interfaces.";
    pub const MISSING_PARTIAL_MODIFIER: &str = "Missing partial modifier on declaration of type '{0}'; another partial declaration of this type exists.";
    pub const PARTIAL_BASE_MISMATCH: &str =
        "Partial declarations of '{0}' must not specify different base classes.";
    pub const BASE_NOT_CLASS: &str = "'{0}': cannot derive from '{1}' because it is not a class.";
    pub const BASE_NOT_ALLOWED: &str = "'{0}': a {1} cannot have a base class.";
    pub const CIRCULAR_BASE: &str = "Circular base type dependency involving '{0}' and '{1}'.";
    pub const INTERFACE_EXPECTED: &str = "Type '{0}' in interface list is not an interface.";
    pub const DUPLICATE_INTERFACE: &str = "'{0}' is already listed in interface list.";
    pub const DUPLICATE_TYPE: &str = "The namespace '{0}' already contains a definition for '{1}'.";
    pub const GENERIC_ARITY_MISMATCH: &str =
        "Using the generic type '{0}' requires {1} type arguments.";
    pub const TYPE_NOT_ACCESSIBLE: &str = "'{0}' is inaccessible due to its protection level.";
    pub const BASE_CLASS_SEALED: &str = "'{0}': cannot derive from sealed type '{1}'.";

    pub const DUPLICATE_MEMBER_NAME: &str =
        "The type '{0}' already contains a definition for '{1}'.";
    pub const OVERLOAD_DIFFERS_ONLY_BY_REF_KIND: &str = "'{0}' cannot define an overloaded {1} that differs only on parameter modifiers '{2}' and '{3}'.";
    pub const DUPLICATE_SIGNATURE: &str =
        "Type '{0}' already defines a member called '{1}' with the same parameter types.";
    pub const INCONSISTENT_INDEXER_NAMES: &str = "Two indexers have different names; the IndexerName annotation must be used with the same name on every indexer within a type.";
    pub const OPERATOR_REQUIRES_MATCHING: &str =
        "The operator '{0}' requires a matching operator '{1}' to also be defined.";
    pub const ACCESSOR_NAME_RESERVED: &str =
        "Type '{0}' already reserves a member called '{1}' with the same parameter types.";
    pub const MEMBER_NAME_SAME_AS_TYPE: &str =
        "'{0}': member names cannot be the same as their enclosing type.";
    pub const INTERFACE_CANNOT_CONTAIN_FIELDS: &str = "Interfaces cannot contain instance fields.";
    pub const INTERFACE_CANNOT_CONTAIN_CONSTRUCTORS: &str = "Interfaces cannot contain constructors.";

    pub const PARTIAL_DUPLICATE_DEFINITION: &str =
        "A partial member '{0}' may not have multiple defining declarations.";
    pub const PARTIAL_DUPLICATE_IMPLEMENTATION: &str =
        "A partial member '{0}' may not have multiple implementing declarations.";
    pub const PARTIAL_MISSING_IMPLEMENTATION: &str =
        "Partial member '{0}' must have an implementation part.";
    pub const PARTIAL_MISSING_DEFINITION: &str = "No defining declaration found for implementing declaration of partial member '{0}'.";
    pub const PARTIAL_RETURN_TYPE_MISMATCH: &str =
        "Both partial member declarations of '{0}' must have the same type.";
    pub const PARTIAL_STATIC_MISMATCH: &str =
        "Both partial member declarations of '{0}' must be static or neither may be static.";
    pub const PARTIAL_ACCESSIBILITY_MISMATCH: &str =
        "Both partial member declarations of '{0}' must have identical accessibility modifiers.";
    pub const PARTIAL_PARAMETER_NAME_DIFFERS: &str = "Partial member declarations of '{0}' have different parameter names: parameter {1} is named '{2}' in the defining declaration but '{3}' in the implementing declaration.";
    pub const PARTIAL_MISSING_ACCESSOR: &str =
        "'{0}': the implementing declaration is missing the '{1}' accessor of the defining declaration.";
    pub const PARTIAL_UNEXPECTED_ACCESSOR: &str =
        "'{0}': the implementing declaration has a '{1}' accessor the defining declaration does not declare.";
    pub const PARTIAL_NOT_ALLOWED: &str = "The 'partial' modifier is not valid on '{0}'.";

    pub const STRUCT_LAYOUT_CYCLE: &str =
        "Struct member '{0}' of type '{1}' causes a cycle in the struct layout.";

    pub const ANNOTATION_NOT_FOUND: &str = "The annotation type '{0}' could not be found.";
    pub const ANNOTATION_INVALID_TARGET: &str = "Annotation '{0}' is not valid on this declaration type. It is only valid on '{1}' declarations.";
    pub const DUPLICATE_ANNOTATION: &str = "Duplicate '{0}' annotation.";
    pub const ANNOTATION_ARGUMENT_COUNT: &str =
        "Annotation '{0}' expects {1} argument(s) but was given {2}.";
    pub const ANNOTATION_ARGUMENT_TYPE: &str = "Argument {0} of annotation '{1}' must be {2}.";
    pub const INVALID_VERSION: &str = "The specified version string '{0}' does not conform to the required format: major[.minor[.build[.revision]]].";
    pub const INVALID_PUBLIC_KEY: &str = "The unit key '{0}' is not a valid hexadecimal public key.";
    pub const INVALID_GRANT: &str = "Friend unit reference '{0}' is invalid: {1}.";
    pub const GRANT_MISSING_KEY: &str = "Friend unit reference '{0}' is invalid. Signed units must specify a public key in their InternalsVisibleTo declarations.";
    pub const CONSTANT_CYCLE: &str =
        "The evaluation of the constant value for '{0}' involves a circular definition.";
    pub const CONSTANT_NOT_FOUND: &str = "The name '{0}' does not refer to a constant field.";
    pub const FORWARDER_CONFLICTS_WITH_SOURCE: &str =
        "Type '{0}' is defined in this unit, but a type forwarder is specified for it.";
    pub const FORWARDER_TARGET_NOT_FOUND: &str =
        "Cannot forward type '{0}' because it does not exist in any referenced unit.";
    pub const FORWARDER_CYCLE: &str = "Type '{0}' is forwarded in a cycle through units '{1}'.";
    pub const DEFAULT_MEMBER_WITH_INDEXER: &str =
        "Cannot specify the DefaultMember annotation on a type containing an indexer.";
    pub const INDEXER_NAME_INVALID: &str =
        "The argument to the 'IndexerName' annotation must be a valid identifier.";
    pub const CONDITIONAL_REQUIRES_VOID: &str =
        "The Conditional annotation is not valid on '{0}' because its return type is not void.";
    pub const DUPLICATE_FORWARDER: &str = "Duplicate type forwarder for type '{0}'.";
    pub const RESOLUTION_LIMIT_EXCEEDED: &str =
        "Resolving annotation '{0}' exceeded the resolution limit and was skipped.";

    pub const GRANT_KEY_MISMATCH: &str = "Friend access was granted by '{0}', but the public key of the output unit ('{1}') does not match that specified by the InternalsVisibleTo annotation in the granting unit.";
    pub const GRANT_SIGNING_MISMATCH: &str = "Friend access was granted by '{0}', but the output unit is not signed while the grant specifies a public key.";

    pub const FIELD_NEVER_USED: &str = "The field '{0}' is never used.";
    pub const FIELD_NEVER_ASSIGNED: &str =
        "Field '{0}' is never assigned to, and will always have its default value.";
    pub const FIELD_ASSIGNED_NEVER_READ: &str =
        "The field '{0}' is assigned but its value is never used.";
}

macro_rules! messages {
    ($($category:ident $name:ident),* $(,)?) => {
        pub static DIAGNOSTIC_MESSAGES: &[DiagnosticMessage] = &[
            $(DiagnosticMessage {
                code: diagnostic_codes::$name,
                category: DiagnosticCategory::$category,
                message: diagnostic_messages::$name,
            },)*
        ];
    };
}

messages! {
    Error TYPE_NOT_FOUND,
    Error PARTIAL_KIND_MISMATCH,
    Error MISSING_PARTIAL_MODIFIER,
    Error PARTIAL_BASE_MISMATCH,
    Error BASE_NOT_CLASS,
    Error BASE_NOT_ALLOWED,
    Error CIRCULAR_BASE,
    Error INTERFACE_EXPECTED,
    Error DUPLICATE_INTERFACE,
    Error DUPLICATE_TYPE,
    Error GENERIC_ARITY_MISMATCH,
    Error TYPE_NOT_ACCESSIBLE,
    Error BASE_CLASS_SEALED,
    Error DUPLICATE_MEMBER_NAME,
    Error OVERLOAD_DIFFERS_ONLY_BY_REF_KIND,
    Error DUPLICATE_SIGNATURE,
    Error INCONSISTENT_INDEXER_NAMES,
    Error OPERATOR_REQUIRES_MATCHING,
    Error ACCESSOR_NAME_RESERVED,
    Error MEMBER_NAME_SAME_AS_TYPE,
    Error INTERFACE_CANNOT_CONTAIN_FIELDS,
    Error INTERFACE_CANNOT_CONTAIN_CONSTRUCTORS,
    Error PARTIAL_DUPLICATE_DEFINITION,
    Error PARTIAL_DUPLICATE_IMPLEMENTATION,
    Error PARTIAL_MISSING_IMPLEMENTATION,
    Error PARTIAL_MISSING_DEFINITION,
    Error PARTIAL_RETURN_TYPE_MISMATCH,
    Error PARTIAL_STATIC_MISMATCH,
    Error PARTIAL_ACCESSIBILITY_MISMATCH,
    Warning PARTIAL_PARAMETER_NAME_DIFFERS,
    Error PARTIAL_MISSING_ACCESSOR,
    Error PARTIAL_UNEXPECTED_ACCESSOR,
    Error PARTIAL_NOT_ALLOWED,
    Error STRUCT_LAYOUT_CYCLE,
    Error ANNOTATION_NOT_FOUND,
    Error ANNOTATION_INVALID_TARGET,
    Error DUPLICATE_ANNOTATION,
    Error ANNOTATION_ARGUMENT_COUNT,
    Error ANNOTATION_ARGUMENT_TYPE,
    Error INVALID_VERSION,
    Error INVALID_PUBLIC_KEY,
    Error INVALID_GRANT,
    Error GRANT_MISSING_KEY,
    Error CONSTANT_CYCLE,
    Error CONSTANT_NOT_FOUND,
    Error FORWARDER_CONFLICTS_WITH_SOURCE,
    Error FORWARDER_TARGET_NOT_FOUND,
    Error FORWARDER_CYCLE,
    Error DEFAULT_MEMBER_WITH_INDEXER,
    Error INDEXER_NAME_INVALID,
    Error CONDITIONAL_REQUIRES_VOID,
    Error DUPLICATE_FORWARDER,
    Error RESOLUTION_LIMIT_EXCEEDED,
    Error GRANT_KEY_MISMATCH,
    Error GRANT_SIGNING_MISMATCH,
    Warning FIELD_NEVER_USED,
    Warning FIELD_NEVER_ASSIGNED,
    Warning FIELD_ASSIGNED_NEVER_READ,
}
