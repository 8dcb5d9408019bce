//! Conversation dialogs for the bot commands.
//!
//! A pure state machine: feed one line of user input, get back the text to
//! show and, when a flow completes, the API call to perform. Keeping it
//! free of IO makes every flow unit-testable.

use std::mem;

/// Cities offered in the selection menu. Free-text names are accepted too.
pub const CITIES: [&str; 15] = [
    "New York",
    "Los Angeles",
    "Chicago",
    "Houston",
    "Phoenix",
    "London",
    "Paris",
    "Tokyo",
    "Sydney",
    "Moscow",
    "Berlin",
    "Toronto",
    "Beijing",
    "Dubai",
    "Sao Paulo",
];

/// A completed flow, ready to be sent to the REST API.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiCall {
    MonthlyProfile {
        city: String,
        month: String,
    },
    BestTravelMonth {
        city: String,
        min_temp: String,
        max_temp: String,
    },
    CompareCities {
        cities: String,
        month: String,
    },
    Metrics,
}

/// Outcome of one input line.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Reply(String),
    Call(ApiCall),
}

#[derive(Debug, Clone, PartialEq, Default)]
enum State {
    #[default]
    Idle,
    ProfileCity,
    ProfileMonth {
        city: String,
    },
    BestCity,
    BestMin {
        city: String,
    },
    BestMax {
        city: String,
        min_temp: String,
    },
    CompareSelect {
        selected: Vec<String>,
    },
    CompareMonth {
        cities: String,
    },
}

#[derive(Debug, Default)]
pub struct Dialog {
    state: State,
}

impl Dialog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the conversation by one user input line.
    pub fn handle(&mut self, input: &str) -> Step {
        let input = input.trim();

        if input == "/cancel" {
            self.state = State::Idle;
            return Step::Reply("Operation cancelled.".to_string());
        }

        if input.starts_with('/') && self.state != State::Idle {
            return Step::Reply(
                "Please finish the current operation or send /cancel first.".to_string(),
            );
        }

        match mem::take(&mut self.state) {
            State::Idle => self.handle_command(input),
            State::ProfileCity => match resolve_city(input) {
                Some(city) => {
                    let reply = format!(
                        "You have selected: {}\nPlease enter the month (1-12):",
                        city
                    );
                    self.state = State::ProfileMonth { city };
                    Step::Reply(reply)
                }
                None => {
                    self.state = State::ProfileCity;
                    Step::Reply(invalid_city_reply())
                }
            },
            State::ProfileMonth { city } => Step::Call(ApiCall::MonthlyProfile {
                city,
                month: input.to_string(),
            }),
            State::BestCity => match resolve_city(input) {
                Some(city) => {
                    let reply = format!(
                        "You have selected: {}\nPlease enter the minimum temperature:",
                        city
                    );
                    self.state = State::BestMin { city };
                    Step::Reply(reply)
                }
                None => {
                    self.state = State::BestCity;
                    Step::Reply(invalid_city_reply())
                }
            },
            State::BestMin { city } => {
                self.state = State::BestMax {
                    city,
                    min_temp: input.to_string(),
                };
                Step::Reply("Please enter the maximum temperature:".to_string())
            }
            State::BestMax { city, min_temp } => Step::Call(ApiCall::BestTravelMonth {
                city,
                min_temp,
                max_temp: input.to_string(),
            }),
            State::CompareSelect { mut selected } => {
                if input.eq_ignore_ascii_case("done") {
                    if selected.is_empty() {
                        return Step::Reply(
                            "You have not selected any cities. Operation cancelled.".to_string(),
                        );
                    }
                    let cities = selected.join(",");
                    let reply = format!(
                        "You have selected: {}\nPlease enter the month (1-12):",
                        selected.join(", ")
                    );
                    self.state = State::CompareMonth { cities };
                    return Step::Reply(reply);
                }

                match resolve_city(input) {
                    Some(city) => {
                        // Selecting a city again removes it
                        if let Some(pos) = selected.iter().position(|c| c == &city) {
                            selected.remove(pos);
                        } else {
                            selected.push(city);
                        }
                        let listed = if selected.is_empty() {
                            "None".to_string()
                        } else {
                            selected.join(", ")
                        };
                        self.state = State::CompareSelect { selected };
                        Step::Reply(format!(
                            "Selected cities: {}\nSelect more or send 'done' when finished.",
                            listed
                        ))
                    }
                    None => {
                        self.state = State::CompareSelect { selected };
                        Step::Reply(invalid_city_reply())
                    }
                }
            }
            State::CompareMonth { cities } => Step::Call(ApiCall::CompareCities {
                cities,
                month: input.to_string(),
            }),
        }
    }

    fn handle_command(&mut self, input: &str) -> Step {
        match input {
            "/start" => Step::Reply(format!(
                "Welcome to the Travelcast bot!\n\n{}",
                help_text()
            )),
            "/help" => Step::Reply(help_text()),
            "/metrics" => Step::Call(ApiCall::Metrics),
            "/monthly_profile" => {
                self.state = State::ProfileCity;
                Step::Reply(format!("Please select the city:\n{}", city_menu()))
            }
            "/best_travel_month" => {
                self.state = State::BestCity;
                Step::Reply(format!("Please select the city:\n{}", city_menu()))
            }
            "/compare_cities" => {
                self.state = State::CompareSelect {
                    selected: Vec::new(),
                };
                Step::Reply(format!(
                    "Please select the cities (one per line, send 'done' when finished):\n{}",
                    city_menu()
                ))
            }
            _ if input.starts_with('/') => Step::Reply(
                "Unknown command. Send /help for the list of commands.".to_string(),
            ),
            _ => Step::Reply("Send /help for the list of commands.".to_string()),
        }
    }
}

fn help_text() -> String {
    "Available commands:\n\
     /monthly_profile - Get the monthly weather profile of a city.\n\
     /best_travel_month - Find the best month to travel to a city.\n\
     /compare_cities - Compare weather conditions of multiple cities.\n\
     /metrics - Get API metrics.\n\
     /cancel - Cancel the current operation."
        .to_string()
}

fn city_menu() -> String {
    CITIES
        .iter()
        .enumerate()
        .map(|(i, city)| format!("{:2}. {}", i + 1, city))
        .collect::<Vec<_>>()
        .join("\n")
}

fn invalid_city_reply() -> String {
    format!(
        "Please pick a number between 1 and {} or type a city name.",
        CITIES.len()
    )
}

/// Menu number or free-text city name.
fn resolve_city(input: &str) -> Option<String> {
    if input.is_empty() {
        return None;
    }
    if let Ok(choice) = input.parse::<usize>() {
        return if (1..=CITIES.len()).contains(&choice) {
            Some(CITIES[choice - 1].to_string())
        } else {
            None
        };
    }
    Some(input.to_string())
}
