macros_utils::routes! {
    mod health,
    mod websites,
}
