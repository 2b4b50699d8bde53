//! Fixtures shared by the unit tests of this crate.

use meta_core::*;

pub fn string_field(number: u32, name: &str, key: bool) -> MessageField {
    MessageField {
        number,
        name: name.to_string(),
        ty: FieldType::String,
        repeated: false,
        key,
    }
}

fn greet_request() -> MessageType {
    MessageType {
        name: "GreetRequest".to_string(),
        fields: vec![string_field(1, "person_id", true), string_field(2, "locale", false)],
    }
}

fn greet_response() -> MessageType {
    MessageType {
        name: "GreetResponse".to_string(),
        fields: vec![string_field(1, "greeting", false)],
    }
}

/// Keyed `Greeter` with a single `greet` method keyed by `person_id`.
pub fn greeter_descriptor() -> DeploymentDescriptor {
    DeploymentDescriptor {
        deployment: DeploymentInfo {
            id: None,
            endpoint: "http://localhost:9080".to_string(),
            description: None,
        },
        services: vec![ServiceDefinition {
            name: "Greeter".to_string(),
            kind: ServiceKind::Keyed,
            methods: vec![Method {
                name: "greet".to_string(),
                input: "GreetRequest".to_string(),
                output: "GreetResponse".to_string(),
            }],
        }],
        messages: vec![greet_request(), greet_response()],
    }
}

/// Add a method to the first service, declaring its input message.
pub fn add_method(descriptor: &mut DeploymentDescriptor, name: &str, input: &str, fields: Vec<MessageField>) {
    descriptor.services[0].methods.push(Method {
        name: name.to_string(),
        input: input.to_string(),
        output: "GreetResponse".to_string(),
    });
    descriptor.messages.push(MessageType {
        name: input.to_string(),
        fields,
    });
}

/// Revision `number` of `Greeter`, registered by deployment `dp_{number}`.
pub fn greeter_revision(number: RevisionNumber, kind: ServiceKind) -> ServiceRevision {
    let input = greet_request();
    let key = kind.is_keyed().then(|| KeyField::from(&input.fields[0]));
    ServiceRevision {
        service: "Greeter".to_string(),
        revision: number,
        deployment_id: format!("dp_{number}"),
        kind,
        methods: vec![MethodContract {
            name: "greet".to_string(),
            input,
            output: greet_response(),
            key,
        }],
        created_at: 1000 + u64::from(number),
    }
}
