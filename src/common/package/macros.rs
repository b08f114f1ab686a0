//! Macros for defining catalog entries.

/// Build a [`CatalogEntry`](crate::common::package::CatalogEntry) for one
/// typelib.
///
/// Platform entries are matched against the identity chain, so versioned
/// identifiers (`"debian:11"`) take priority over bare ones (`"debian"`) for
/// the releases they name. `unavailable` marks a platform that is known to
/// lack the library.
///
/// ```ignore
/// typelib!("Adw", "1", {
///     "debian:11" => unavailable,
///     "alpine" => ["libadwaita"],
///     "debian" => ["gir1.2-adw-1"],
/// })
/// ```
#[macro_export]
macro_rules! typelib {
    (@packages unavailable) => {
        $crate::common::package::PlatformPackages::Unavailable
    };

    (@packages [$($pkg:literal),+ $(,)?]) => {
        $crate::common::package::PlatformPackages::Packages(&[$($pkg),+])
    };

    ($namespace:literal, $version:literal, { $($identifier:literal => $packages:tt),* $(,)? }) => {
        $crate::common::package::CatalogEntry {
            namespace: $namespace,
            version: $version,
            artifact: concat!($namespace, "-", $version, ".typelib"),
            platforms: &[
                $($crate::common::package::PlatformEntry {
                    identifier: $identifier,
                    packages: $crate::typelib!(@packages $packages),
                }),*
            ],
        }
    };
}
