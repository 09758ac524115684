use compact_str::CompactString;
use serde::Serialize;

pub const ROUTES_PER_PAGE: usize = 20;

#[derive(Clone, Debug, Serialize)]
pub struct Station {
    pub id: CompactString,
    pub name: CompactString,
}

#[derive(Clone, Debug, Serialize)]
pub struct Line {
    pub id: CompactString,
    pub name: CompactString,
    pub color: CompactString,
    pub stations: Vec<Station>,
}

#[derive(Clone, Debug, Serialize)]
pub struct BusRoute {
    pub id: CompactString,
    pub name: CompactString,
}

/// Static reference data. Built once at startup and never mutated.
pub struct Catalog {
    pub lines: Vec<Line>,
    pub routes: Vec<BusRoute>,
}

/// Which slice of the feeder route catalog is displayed.
#[derive(Clone, Debug, Default)]
pub struct RouteQuery {
    pub search: String,
    /// 1-based page number.
    pub page: usize,
}

fn stations(raw: &[(&str, &str)]) -> Vec<Station> {
    raw.iter()
        .map(|(id, name)| Station {
            id: CompactString::from(*id),
            name: CompactString::from(*name),
        })
        .collect()
}

fn line(name: &str, color: &str, raw_stations: &[(&str, &str)]) -> Line {
    // Lines are identified by their display name
    Line {
        id: CompactString::from(name),
        name: CompactString::from(name),
        color: CompactString::from(color),
        stations: stations(raw_stations),
    }
}

impl Catalog {
    pub fn new(lines: Vec<Line>, routes: Vec<BusRoute>) -> Self {
        Self { lines, routes }
    }

    pub fn medellin() -> Self {
        let metro_a = [
            ("NQI", "Niquía"),
            ("BEL", "Bello"),
            ("MDX", "Madera"),
            ("ACE", "Acevedo"),
            ("TRI", "Tricentenario"),
            ("CAR", "Caribe"),
            ("UNI", "Universidad"),
            ("HOS", "Hospital"),
            ("PRA", "Prado"),
            ("PBE", "Parque Berrío"),
            ("SAN", "San Antonio"),
            ("ALP", "Alpujarra"),
            ("EXP", "Exposiciones"),
            ("IND", "Industriales"),
            ("POB", "Poblado"),
            ("AGU", "Aguacatala"),
            ("AYU", "Ayurá"),
            ("ENV", "Envigado"),
            ("ITA", "Itagüí"),
            ("SAB", "Sabaneta"),
            ("LES", "La Estrella"),
        ];
        let metro_b = [
            ("SAN_B", "San Antonio"),
            ("CIS_B", "Cisneros"),
            ("SUR_B", "Suramericana"),
            ("EST_B", "Estadio"),
            ("FLO_B", "Floresta"),
            ("SLU_B", "Santa Lucía"),
            ("SJA_B", "San Javier"),
        ];
        let tranvia = [
            ("SAN_T", "San Antonio"),
            ("SJO_T", "San José"),
            ("PAG_T", "Pabellón del Agua EPM"),
            ("BIC_T", "Bicentenario"),
            ("BUE_T", "Buenos Aires"),
            ("MIR_T", "Miraflores"),
            ("LOY_T", "Loyola"),
            ("AEC_T", "Alejandro Echavarría"),
            ("ORI_T", "Oriente"),
        ];
        let metro_cable_k = [
            ("ACE_K", "Acevedo"),
            ("AND_K", "Andalucía"),
            ("PCS_K", "Popular"),
            ("SDO_K", "Santo Domingo Savio"),
        ];

        let lines = vec![
            line("Metro A", "#A4D16A", &metro_a),
            line("Metro B", "#E57373", &metro_b),
            line("Tranvía", "#F06292", &tranvia),
            line("Metro Cable (Línea K)", "#64B5F6", &metro_cable_k),
            line("Buses Integrados", "#FFB74D", &[]),
        ];

        let routes = [
            ("C3-001", "C3-001 Santa Gema ⇄ Aguacatala"),
            ("C3-001A", "C3-001A Las Cabras ⇄ Aguacatala"),
            ("C3-002", "C3-002 Aguacatala ⇄ Bolivariana"),
            ("C6-001", "C6-001 Circular Coonatra"),
            ("O", "O (Circular)"),
            ("130", "130 La América"),
            ("133", "133 Laureles"),
            ("250", "250 Belén"),
            ("300", "300 Robledo"),
            ("301", "301 Castilla"),
            ("304", "304 Manrique"),
            ("305", "305 Aranjuez"),
            ("C23", "C23 Circular Boston"),
        ]
        .iter()
        .map(|(id, name)| BusRoute {
            id: CompactString::from(*id),
            name: CompactString::from(*name),
        })
        .collect();

        Self::new(lines, routes)
    }

    pub fn line(&self, id: &str) -> Option<&Line> {
        self.lines.iter().find(|l| l.id.as_str() == id)
    }

    pub fn has_line(&self, id: &str) -> bool {
        self.line(id).is_some()
    }

    /// Every line, station and route id.
    pub fn known_ids(&self) -> impl Iterator<Item = &CompactString> {
        self.lines
            .iter()
            .flat_map(|l| std::iter::once(&l.id).chain(l.stations.iter().map(|s| &s.id)))
            .chain(self.routes.iter().map(|r| &r.id))
    }

    pub fn route_page_count(&self) -> usize {
        self.routes.len().div_ceil(ROUTES_PER_PAGE).max(1)
    }

    /// Routes displayed for `query`: the requested page is cut first, then
    /// narrowed by a case-insensitive match on the display name.
    pub fn filter_routes(&self, query: &RouteQuery) -> Vec<&BusRoute> {
        if query.page == 0 || query.page > self.route_page_count() {
            return Vec::new();
        }
        let needle = query.search.to_lowercase();
        self.routes
            .iter()
            .skip((query.page - 1) * ROUTES_PER_PAGE)
            .take(ROUTES_PER_PAGE)
            .filter(|r| r.name.to_lowercase().contains(&needle))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(search: &str, page: usize) -> RouteQuery {
        RouteQuery {
            search: search.to_string(),
            page,
        }
    }

    #[test]
    fn test_medellin_catalog_shape() {
        let catalog = Catalog::medellin();
        assert_eq!(catalog.lines.len(), 5);
        assert_eq!(catalog.line("Metro A").unwrap().stations.len(), 21);
        assert!(catalog.line("Buses Integrados").unwrap().stations.is_empty());
        assert_eq!(catalog.routes.len(), 13);
        // 5 lines + 41 stations + 13 routes
        assert_eq!(catalog.known_ids().count(), 59);
    }

    #[test]
    fn test_filter_is_case_insensitive() {
        let catalog = Catalog::medellin();
        let found = catalog.filter_routes(&query("rObLeDo", 1));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id.as_str(), "300");

        let found = catalog.filter_routes(&query("aguacatala", 1));
        assert_eq!(found.len(), 3);
    }

    #[test]
    fn test_empty_search_shows_whole_page() {
        let catalog = Catalog::medellin();
        assert_eq!(catalog.filter_routes(&query("", 1)).len(), 13);
        assert_eq!(catalog.route_page_count(), 1);
    }

    #[test]
    fn test_pages_out_of_range_are_empty() {
        let catalog = Catalog::medellin();
        assert!(catalog.filter_routes(&query("", 0)).is_empty());
        assert!(catalog.filter_routes(&query("", 2)).is_empty());
    }

    #[test]
    fn test_huge_page_is_empty() {
        let catalog = Catalog::medellin();
        assert!(catalog.filter_routes(&query("", usize::MAX)).is_empty());
        assert!(catalog.filter_routes(&query("", usize::MAX / ROUTES_PER_PAGE + 2)).is_empty());
    }

    #[test]
    fn test_search_only_covers_selected_page() {
        let routes = (0..25)
            .map(|i| BusRoute {
                id: CompactString::from(format!("R{}", i)),
                name: CompactString::from(format!("Route {}", i)),
            })
            .collect();
        let catalog = Catalog::new(Vec::new(), routes);
        assert_eq!(catalog.route_page_count(), 2);

        // "Route 24" lives on page 2
        assert!(catalog.filter_routes(&query("route 24", 1)).is_empty());
        let found = catalog.filter_routes(&query("route 24", 2));
        assert_eq!(found.len(), 1);
        assert_eq!(catalog.filter_routes(&query("", 2)).len(), 5);
    }
}
