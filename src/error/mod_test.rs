use super::*;

#[test]
fn names_are_stable() {
    assert_eq!(ErrorCode::NoMemory.name(), "NoMemoryError");
    assert_eq!(ErrorCode::Key.name(), "KeyError");
}

#[test]
fn load_error_maps_to_sensible_runtime_code() {
    assert_eq!(ErrorCode::from(LoadError::NoMemory), ErrorCode::NoMemory);
    assert_eq!(ErrorCode::from(LoadError::BadHeader), ErrorCode::Syntax);
    assert_eq!(ErrorCode::from(LoadError::Truncated), ErrorCode::Syntax);
}
