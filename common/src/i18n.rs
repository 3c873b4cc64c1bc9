//! Localized labels for the summary page, the aggregate form field and CLI messages

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    En,
    #[default]
    No,
    Es,
}

impl Lang {
    pub fn code(&self) -> &'static str {
        match self {
            Lang::En => "en",
            Lang::No => "no",
            Lang::Es => "es",
        }
    }

    pub fn labels(&self) -> &'static Labels {
        match self {
            Lang::En => &EN,
            Lang::No => &NO,
            Lang::Es => &ES,
        }
    }
}

impl std::str::FromStr for Lang {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "en" | "english" => Ok(Lang::En),
            "no" | "nb" | "nn" | "norsk" => Ok(Lang::No),
            "es" | "español" | "espanol" => Ok(Lang::Es),
            _ => Err(format!("Unknown language: {}. Use en, no or es", s)),
        }
    }
}

impl std::fmt::Display for Lang {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// One language's strings
#[derive(Debug)]
pub struct Labels {
    pub title: &'static str,
    pub object: &'static str,
    pub object_type: &'static str,
    pub material: &'static str,
    pub age: &'static str,
    pub area: &'static str,
    pub depth: &'static str,
    pub location: &'static str,
    pub finder_name: &'static str,
    pub finder_email: &'static str,
    pub owner_name: &'static str,
    pub owner_email: &'static str,
    /// Notes header, a colon is appended on the page
    pub notes: &'static str,
    /// Caption prefix, the photo number follows after a space
    pub photo: &'static str,
    pub export_failed: &'static str,
    pub wgs84_fallback: &'static str,
}

impl Labels {
    pub fn photo_caption(&self, number: usize) -> String {
        format!("{} {}", self.photo, number)
    }
}

static EN: Labels = Labels {
    title: "Find – summary",
    object: "Object",
    object_type: "Type",
    material: "Assumed material",
    age: "Estimated age",
    area: "Area type",
    depth: "Find depth",
    location: "Location (GPS)",
    finder_name: "Finder",
    finder_email: "Finder email",
    owner_name: "Land owner",
    owner_email: "Owner email",
    notes: "Notes",
    photo: "Photo",
    export_failed: "Could not create the filled PDF",
    wgs84_fallback: "Position is outside UTM zone 32, using WGS84",
};

static NO: Labels = Labels {
    title: "Funn – sammendrag",
    object: "Gjenstand",
    object_type: "Type",
    material: "Antatt materiale",
    age: "Antatt alder",
    area: "Arealtype",
    depth: "Funndybde",
    location: "Posisjon (GPS)",
    finder_name: "Finner",
    finder_email: "Finner e-post",
    owner_name: "Grunneier",
    owner_email: "Grunneier e-post",
    notes: "Notater",
    photo: "Foto",
    export_failed: "Kunne ikke lage utfylt PDF",
    wgs84_fallback: "Posisjonen er utenfor UTM-sone 32, bruker WGS84",
};

static ES: Labels = Labels {
    title: "Hallazgo – resumen",
    object: "Objeto",
    object_type: "Tipo",
    material: "Material supuesto",
    age: "Edad estimada",
    area: "Tipo de zona",
    depth: "Profundidad",
    location: "Ubicación (GPS)",
    finder_name: "Descubridor",
    finder_email: "Correo del descubridor",
    owner_name: "Propietario",
    owner_email: "Correo del propietario",
    notes: "Notas",
    photo: "Foto",
    export_failed: "No se pudo crear el PDF rellenado",
    wgs84_fallback: "La posición está fuera de la zona UTM 32, se usa WGS84",
};
