//! Plain-text rendering of command results.

use crate::model::{Car, CarDetail, Driver, DriverDetail, FleetCounts, Manufacturer};
use crate::query::Page;

/// Human-readable rendering for `--format plain`.
pub trait PlainText {
    /// Render as one or more lines, without a trailing newline.
    fn plain_text(&self) -> String;
}

impl PlainText for Manufacturer {
    fn plain_text(&self) -> String {
        format!("{}\t{}\t{}", self.id, self.name, self.country)
    }
}

impl PlainText for Driver {
    fn plain_text(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}",
            self.id,
            self.username,
            self.full_name(),
            self.license_number
        )
    }
}

impl PlainText for Car {
    fn plain_text(&self) -> String {
        format!("{}\t{}\t{}", self.id, self.model, self.manufacturer.name)
    }
}

impl PlainText for DriverDetail {
    fn plain_text(&self) -> String {
        let driver = &self.driver;
        let mut lines = vec![
            format!("Driver {}: {}", driver.id, driver),
            format!("License number: {}", driver.license_number),
            format!("Joined: {}", driver.date_joined.format("%Y-%m-%d %H:%M")),
        ];
        if self.cars.is_empty() {
            lines.push("Cars: none".to_string());
        } else {
            lines.push("Cars:".to_string());
            lines.extend(
                self.cars
                    .iter()
                    .map(|car| format!("  {} ({})", car, car.manufacturer.name)),
            );
        }
        lines.join("\n")
    }
}

impl PlainText for CarDetail {
    fn plain_text(&self) -> String {
        let car = &self.car;
        let mut lines = vec![
            format!("Car {}: {}", car.id, car),
            format!("Manufacturer: {}", car.manufacturer),
        ];
        if self.drivers.is_empty() {
            lines.push("Drivers: none".to_string());
        } else {
            lines.push("Drivers:".to_string());
            lines.extend(self.drivers.iter().map(|driver| format!("  {driver}")));
        }
        lines.join("\n")
    }
}

impl PlainText for FleetCounts {
    fn plain_text(&self) -> String {
        format!(
            "Drivers:       {}\nCars:          {}\nManufacturers: {}",
            self.num_drivers, self.num_cars, self.num_manufacturers
        )
    }
}

impl<T: PlainText> PlainText for Page<T> {
    fn plain_text(&self) -> String {
        let mut lines: Vec<String> = self.iter().map(PlainText::plain_text).collect();
        if self.is_empty() {
            lines.push("No records found.".to_string());
        }
        lines.push(format!(
            "-- page {} of {} ({} total)",
            self.number,
            self.num_pages(),
            self.total_count
        ));
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::query::PageRequest;

    fn toyota() -> Manufacturer {
        Manufacturer {
            id: 1,
            name: "Toyota".to_string(),
            country: "Japan".to_string(),
        }
    }

    fn driver() -> Driver {
        Driver {
            id: 2,
            username: "driver_one".to_string(),
            first_name: "Test".to_string(),
            last_name: "Driver".to_string(),
            license_number: "AAA12345".to_string(),
            date_joined: Utc::now(),
        }
    }

    #[test]
    fn test_record_lines() {
        assert_eq!(toyota().plain_text(), "1\tToyota\tJapan");
        assert_eq!(driver().plain_text(), "2\tdriver_one\tTest Driver\tAAA12345");
    }

    #[test]
    fn test_car_detail() {
        let detail = CarDetail {
            car: Car {
                id: 3,
                model: "Camry".to_string(),
                manufacturer: toyota(),
            },
            drivers: vec![driver()],
        };
        let text = detail.plain_text();
        assert!(text.starts_with("Car 3: Camry"));
        assert!(text.contains("Manufacturer: Toyota Japan"));
        assert!(text.contains("  driver_one (Test Driver)"));
    }

    #[test]
    fn test_driver_detail_without_cars() {
        let detail = DriverDetail {
            driver: driver(),
            cars: vec![],
        };
        assert!(detail.plain_text().contains("Cars: none"));
    }

    #[test]
    fn test_page_footer() {
        let page = Page::new(vec![toyota()], PageRequest::new(2, 5), 6);
        let text = page.plain_text();
        assert!(text.starts_with("1\tToyota\tJapan"));
        assert!(text.ends_with("-- page 2 of 2 (6 total)"));

        let empty: Page<Manufacturer> = Page::new(vec![], PageRequest::new(1, 5), 0);
        assert!(empty.plain_text().contains("No records found."));
    }

    #[test]
    fn test_counts() {
        let counts = FleetCounts {
            num_drivers: 1,
            num_cars: 2,
            num_manufacturers: 3,
        };
        let text = counts.plain_text();
        assert!(text.contains("Drivers:       1"));
        assert!(text.contains("Manufacturers: 3"));
    }
}
