use userstore_core::{NewUser, User, UserValidationError};

#[test]
fn validate_accepts_well_formed_user() {
    let user = NewUser::new("test", "test@test.com", 20);
    assert!(user.validate().is_ok());
}

#[test]
fn validate_rejects_each_bad_field() {
    assert_eq!(
        NewUser::new("", "test@test.com", 20).validate(),
        Err(UserValidationError::EmptyName)
    );
    assert!(matches!(
        NewUser::new("test", "nope", 20).validate(),
        Err(UserValidationError::InvalidEmail { .. })
    ));
    assert_eq!(
        NewUser::new("test", "test@test.com", -1).validate(),
        Err(UserValidationError::NegativeAge { age: -1 })
    );
}

#[test]
fn zero_age_is_valid() {
    assert!(NewUser::new("newborn", "parent@test.com", 0)
        .validate()
        .is_ok());
}

#[test]
fn user_serializes_with_stable_field_names() {
    let user = User {
        id: 7,
        name: "test".to_string(),
        email: "test@test.com".to_string(),
        age: 20,
    };

    let json = serde_json::to_value(&user).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "id": 7,
            "name": "test",
            "email": "test@test.com",
            "age": 20,
        })
    );

    let back: User = serde_json::from_value(json).unwrap();
    assert_eq!(back, user);
}
