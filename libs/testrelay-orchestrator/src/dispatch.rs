// Dispatch: send the start command for a validated scope

use crate::channel::CommandChannel;
use crate::error::ChannelError;
use crate::validator::TestScope;
use std::collections::HashMap;
use testrelay_common::protocol::{
    PARAM_ACTION, PARAM_ASSEMBLY, PARAM_CLASS, PARAM_METHOD, RUN_TESTS_COMMAND,
};
use testrelay_common::types::CommandResponse;

/// Start parameters for `scope`.
/// Fields outside the scope are sent empty so the host never sees a mixed combination.
pub fn start_params(scope: &TestScope) -> HashMap<String, String> {
    HashMap::from([
        (PARAM_ACTION.to_string(), scope.mode().action().to_string()),
        (PARAM_ASSEMBLY.to_string(), scope.assembly().to_string()),
        (
            PARAM_CLASS.to_string(),
            scope.class_name().unwrap_or_default().to_string(),
        ),
        (
            PARAM_METHOD.to_string(),
            scope.method_name().unwrap_or_default().to_string(),
        ),
    ])
}

/// Send the start command once
pub async fn dispatch(
    channel: &dyn CommandChannel,
    scope: &TestScope,
) -> Result<CommandResponse, ChannelError> {
    channel.send(RUN_TESTS_COMMAND, &start_params(scope)).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_scope_sends_every_field() {
        let params = start_params(&TestScope::Method {
            assembly: "Core".to_string(),
            class_name: "MathTests".to_string(),
            method_name: "Add".to_string(),
        });

        assert_eq!(params[PARAM_ACTION], "run_test_method");
        assert_eq!(params[PARAM_ASSEMBLY], "Core");
        assert_eq!(params[PARAM_CLASS], "MathTests");
        assert_eq!(params[PARAM_METHOD], "Add");
    }

    #[test]
    fn test_out_of_scope_fields_are_cleared() {
        let class = start_params(&TestScope::Class {
            assembly: "Core".to_string(),
            class_name: "MathTests".to_string(),
        });
        assert_eq!(class[PARAM_ACTION], "run_test_class");
        assert_eq!(class[PARAM_METHOD], "");

        let assembly = start_params(&TestScope::Assembly {
            assembly: "Core".to_string(),
        });
        assert_eq!(assembly[PARAM_ACTION], "run_test_asmdef");
        assert_eq!(assembly[PARAM_CLASS], "");
        assert_eq!(assembly[PARAM_METHOD], "");
        assert_eq!(assembly.len(), 4);
    }
}
