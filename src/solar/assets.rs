/// Every image the scene uses, resolved against the configured asset base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureAsset {
    Stars,
    Sun,
    Mercury,
    Venus,
    Earth,
    Mars,
    Jupiter,
    Saturn,
    SaturnRing,
    Uranus,
    UranusRing,
    Neptune,
    Pluto,
}

impl TextureAsset {
    pub fn file_name(self) -> &'static str {
        match self {
            TextureAsset::Stars => "stars.jpg",
            TextureAsset::Sun => "sun.jpg",
            TextureAsset::Mercury => "mercury.jpg",
            TextureAsset::Venus => "venus.jpg",
            TextureAsset::Earth => "earth.jpg",
            TextureAsset::Mars => "mars.jpg",
            TextureAsset::Jupiter => "jupiter.jpg",
            TextureAsset::Saturn => "saturn.jpg",
            TextureAsset::SaturnRing => "saturn_ring.png",
            TextureAsset::Uranus => "uranus.jpg",
            TextureAsset::UranusRing => "uranus_ring.png",
            TextureAsset::Neptune => "neptune.jpg",
            TextureAsset::Pluto => "pluto.jpg",
        }
    }
}
