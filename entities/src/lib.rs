pub mod local_setting;

pub mod prelude {
    pub use super::local_setting::Entity as LocalSetting;
}
