pub mod ad;
pub mod content;
pub mod country;
pub mod download_link;
pub mod download_mirror;
pub mod episode;
pub mod genre;
pub mod site_setting;
pub mod trailer;

pub use ad::Entity as AdEntity;
pub use content::Entity as ContentEntity;
pub use country::Entity as CountryEntity;
pub use download_link::Entity as DownloadLinkEntity;
pub use download_mirror::Entity as DownloadMirrorEntity;
pub use episode::Entity as EpisodeEntity;
pub use genre::Entity as GenreEntity;
pub use site_setting::Entity as SiteSettingEntity;
pub use trailer::Entity as TrailerEntity;
