use anyhow::{Result, anyhow};

// Filtros de busca do anify.to e o montador do fragmento de query.
//
// A seleção inteira vira uma struct com campos nomeados, montada uma vez a
// partir das flags da CLI e consumida uma vez para gerar a query.

// Grupo de seleção única: status da série
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Status {
    #[default]
    Default,
    Ongoing,
    Completed,
}

impl Status {
    pub fn query_value(&self) -> &'static str {
        match self {
            Status::Default => "",
            Status::Ongoing => "Ongoing",
            Status::Completed => "Completed",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "default" => Ok(Status::Default),
            "ongoing" => Ok(Status::Ongoing),
            "completed" => Ok(Status::Completed),
            _ => Err(anyhow!(
                "status inválido: {} (valores: default, ongoing, completed)",
                s
            )),
        }
    }
}

// Grupo de seleção única: ordenação dos resultados
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Order {
    #[default]
    Default,
    NameAz,
    NameZa,
    DateNewOld,
    DateOldNew,
    Score,
    MostWatched,
}

impl Order {
    pub fn query_value(&self) -> &'static str {
        match self {
            Order::Default => "",
            Order::NameAz => "nameaz",
            Order::NameZa => "nameza",
            Order::DateNewOld => "datenewold",
            Order::DateOldNew => "dateoldnew",
            Order::Score => "score",
            Order::MostWatched => "mostwatched",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "default" => Ok(Order::Default),
            "nameaz" => Ok(Order::NameAz),
            "nameza" => Ok(Order::NameZa),
            "datenewold" => Ok(Order::DateNewOld),
            "dateoldnew" => Ok(Order::DateOldNew),
            "score" => Ok(Order::Score),
            "mostwatched" => Ok(Order::MostWatched),
            _ => Err(anyhow!(
                "ordenação inválida: {} (valores: nameaz, nameza, datenewold, dateoldnew, score, mostwatched)",
                s
            )),
        }
    }
}

// Seleção de filtros montada a partir das opções do usuário.
// Os vetores guardam os valores de query já mapeados pelas tabelas abaixo.
#[derive(Debug, Clone, Default)]
pub struct FilterSelection {
    pub genres: Vec<String>,
    pub score: Vec<String>,
    pub years: Vec<String>,
    pub ratings: Vec<String>,
    pub status: Status,
    pub order: Order,
}

impl FilterSelection {
    // Função para montar o fragmento de query, na ordem fixa que o site
    // espera: genres, score, years, ratings, status, order. Cada componente
    // não vazio termina em "&"; grupo vazio não contribui nada.
    pub fn build_query(&self) -> String {
        let mut query = String::new();
        append_checkbox_group(&mut query, "genres", &self.genres);
        append_checkbox_group(&mut query, "score", &self.score);
        append_checkbox_group(&mut query, "years", &self.years);
        append_checkbox_group(&mut query, "ratings", &self.ratings);
        if self.status != Status::Default {
            query.push_str("status=");
            query.push_str(self.status.query_value());
            query.push('&');
        }
        if self.order != Order::Default {
            query.push_str("order[]=");
            query.push_str(self.order.query_value());
            query.push('&');
        }
        query
    }
}

// Grupos de checkbox viram pares name[]=valor unidos por &
fn append_checkbox_group(query: &mut String, name: &str, values: &[String]) {
    if values.is_empty() {
        return;
    }
    let part = values
        .iter()
        .map(|value| format!("{}[]={}", name, value))
        .collect::<Vec<_>>()
        .join("&");
    query.push_str(&part);
    query.push('&');
}

// Função para mapear um nome exibido (ou o próprio valor de query) para o
// valor de query correspondente
pub fn lookup(options: &[(&str, &str)], name: &str) -> Result<String> {
    options
        .iter()
        .find(|(display, value)| {
            display.eq_ignore_ascii_case(name) || value.eq_ignore_ascii_case(name)
        })
        .map(|(_, value)| value.to_string())
        .ok_or_else(|| {
            anyhow!(
                "opção inválida: {} (valores: {})",
                name,
                options
                    .iter()
                    .map(|(display, _)| *display)
                    .collect::<Vec<_>>()
                    .join(", ")
            )
        })
}

// Tabelas de opções do site: (nome exibido, valor de query)

pub const GENRES: &[(&str, &str)] = &[
    ("Action", "Action"),
    ("Adventure", "Adventure"),
    ("Chinese", "Chinese"),
    ("Comedy", "Comedy"),
    ("Detective", "Detective"),
    ("Drama", "Drama"),
    ("Ecchi", "Ecchi"),
    ("Fantasy", "Fantasy"),
    ("Gourmet", "Gourmet"),
    ("Harem", "Harem"),
    ("High Stakes Game", "High+Stakes+Game"),
    ("Historical", "Historical"),
    ("Horror", "Horror"),
    ("Isekai", "Isekai"),
    ("Iyashikei", "Iyashikei"),
    ("Josei", "Josei"),
    ("Kids", "Kids"),
    ("Magic", "Magic"),
    ("Martial Arts", "Martial+Arts"),
    ("Mecha", "Mecha"),
    ("Military", "Military"),
    ("Music", "Music"),
    ("Mystery", "Mystery"),
    ("Mythology", "Mythology"),
    ("Parody", "Parody"),
    ("Psychological", "Psychological"),
    ("Racing", "Racing"),
    ("Reincarnation", "Reincarnation"),
    ("Romance", "Romance"),
    ("Samurai", "Samurai"),
    ("School", "School"),
    ("Sci-Fi", "Sci-Fi"),
    ("Seinen", "Seinen"),
    ("Shoujo", "Shoujo"),
    ("Shoujo Ai", "Shoujo+Ai"),
    ("Shounen", "Shounen"),
    ("Shounen Ai", "Shounen+Ai"),
    ("Slice of Life", "Slice+of+Life"),
    ("Space", "Space"),
    ("Sports", "Sports"),
    ("Strategy Game", "Strategy+Game"),
    ("Super Power", "Super+Power"),
    ("Supernatural", "Supernatural"),
    ("Survival", "Survival"),
    ("Suspense", "Suspense"),
    ("Team Sports", "Team+Sports"),
    ("Time Travel", "Time+Travel"),
    ("Vampire", "Vampire"),
    ("Video Game", "Video+Game"),
];

pub const SCORES: &[(&str, &str)] = &[
    ("Outstanding (9+)", "outstanding"),
    ("Excellent (8+)", "excellent"),
    ("Very Good (7+)", "verygood"),
    ("Good (6+)", "good"),
    ("Average (5+)", "average"),
    ("Poor (4+)", "poor"),
    ("Bad (3+)", "bad"),
    ("Horrible (2+)", "horrible"),
];

pub const YEARS: &[(&str, &str)] = &[
    ("2024", "2024"),
    ("2023", "2023"),
    ("2022", "2022"),
    ("2021", "2021"),
    ("2020", "2020"),
    ("2019", "2019"),
    ("2018", "2018"),
    ("2017", "2017"),
    ("2016", "2016"),
    ("2015", "2015"),
    ("2014", "2014"),
    ("2013", "2013"),
    ("2012", "2012"),
    ("2011", "2011"),
    ("2010", "2010"),
    ("2009", "2009"),
    ("2008", "2008"),
    ("2007", "2007"),
    ("2006", "2006"),
    ("2005", "2005"),
    ("2004", "2004"),
    ("2003", "2003"),
    ("2002", "2002"),
    ("2001", "2001"),
    ("2000", "2000"),
    ("1990 - 1999", "1990"),
    ("1980 - 1989", "1980"),
    ("1970 - 1979", "1970"),
    ("1960 - 1969", "1960"),
];

pub const RATINGS: &[(&str, &str)] = &[
    ("G - All Ages", "all-ages"),
    ("PG - Children", "children"),
    ("PG-13 - Teens 13 or older", "pg13"),
    ("R - 17+ (violence & profanity)", "r17"),
    ("R+ - Mild Nudity", "rplus"),
];

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_selection_builds_empty_query() {
        assert_eq!(FilterSelection::default().build_query(), "");
    }

    #[test]
    fn checkbox_groups_render_repeated_pairs() {
        let selection = FilterSelection {
            genres: vec!["Action".to_string(), "Slice+of+Life".to_string()],
            years: vec!["2024".to_string()],
            ..Default::default()
        };
        assert_eq!(
            selection.build_query(),
            "genres[]=Action&genres[]=Slice+of+Life&years[]=2024&"
        );
    }

    #[test]
    fn single_selects_render_once() {
        let selection = FilterSelection {
            status: Status::Ongoing,
            order: Order::Score,
            ..Default::default()
        };
        assert_eq!(selection.build_query(), "status=Ongoing&order[]=score&");
    }

    #[test]
    fn components_keep_fixed_order() {
        let selection = FilterSelection {
            genres: vec!["Action".to_string()],
            score: vec!["good".to_string()],
            years: vec!["2023".to_string()],
            ratings: vec!["pg13".to_string()],
            status: Status::Completed,
            order: Order::NameAz,
        };
        assert_eq!(
            selection.build_query(),
            "genres[]=Action&score[]=good&years[]=2023&ratings[]=pg13&status=Completed&order[]=nameaz&"
        );
    }

    #[test]
    fn lookup_accepts_display_name_or_value() {
        assert_eq!(lookup(GENRES, "Slice of Life").unwrap(), "Slice+of+Life");
        assert_eq!(lookup(SCORES, "verygood").unwrap(), "verygood");
        assert!(lookup(GENRES, "Culinária").is_err());
    }

    #[test]
    fn status_and_order_parse() {
        assert_eq!(Status::parse("ongoing").unwrap(), Status::Ongoing);
        assert_eq!(Order::parse("MostWatched").unwrap(), Order::MostWatched);
        assert!(Status::parse("paused").is_err());
    }
}
