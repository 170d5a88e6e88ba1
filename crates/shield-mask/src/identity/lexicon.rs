//! Embedded word lists for realistic substitutes.

pub(crate) const FIRST_NAMES: &[&str] = &[
    "James", "Mary", "Robert", "Patricia", "John", "Jennifer", "Michael", "Linda", "David",
    "Elizabeth", "William", "Barbara", "Richard", "Susan", "Joseph", "Jessica", "Thomas", "Sarah",
    "Charles", "Karen", "Daniel", "Lisa", "Matthew", "Nancy", "Anthony", "Betty", "Mark",
    "Margaret", "Donald", "Sandra", "Steven", "Ashley", "Paul", "Kimberly", "Andrew", "Emily",
    "Joshua", "Donna", "Kenneth", "Michelle", "Kevin", "Carol", "Brian", "Amanda", "George",
    "Melissa", "Timothy", "Deborah", "Ronald", "Stephanie", "Edward", "Rebecca", "Jason", "Sharon",
    "Jeffrey", "Laura", "Ryan", "Cynthia", "Jacob", "Kathleen", "Gary", "Amy", "Nicholas",
    "Angela", "Eric", "Shirley", "Jonathan", "Anna", "Stephen", "Brenda", "Larry", "Pamela",
];

pub(crate) const LAST_NAMES: &[&str] = &[
    "Smith", "Johnson", "Williams", "Brown", "Jones", "Garcia", "Miller", "Davis", "Rodriguez",
    "Martinez", "Hernandez", "Lopez", "Gonzalez", "Wilson", "Anderson", "Thomas", "Taylor",
    "Moore", "Jackson", "Martin", "Lee", "Perez", "Thompson", "White", "Harris", "Sanchez",
    "Clark", "Ramirez", "Lewis", "Robinson", "Walker", "Young", "Allen", "King", "Wright",
    "Scott", "Torres", "Nguyen", "Hill", "Flores", "Green", "Adams", "Nelson", "Baker", "Hall",
    "Rivera", "Campbell", "Mitchell", "Carter", "Roberts", "Gomez", "Phillips", "Evans", "Turner",
    "Diaz", "Parker", "Cruz", "Edwards", "Collins", "Reyes", "Stewart", "Morris", "Morales",
    "Murphy", "Cook", "Rogers", "Gutierrez", "Ortiz", "Morgan", "Cooper", "Peterson", "Bailey",
];

pub(crate) const COMPANY_WORDS: &[&str] = &[
    "Summit", "Riverbend", "Northfield", "Lakeside", "Pioneer", "Heritage", "Keystone",
    "Crestview", "Granite", "Prairie", "Harbor", "Evergreen", "Frontier", "Maple", "Cardinal",
    "Liberty", "Meridian", "Oakwood", "Silverline", "Bluestem", "Ironwood", "Westbrook",
];

pub(crate) const COMPANY_SUFFIXES: &[&str] = &[
    "Holdings LLC", "Partners", "Group Inc", "Associates", "Enterprises LLC", "Properties LLC",
    "Farms Inc", "Industries", "Capital LLC", "Company",
];

pub(crate) const BANK_SUFFIXES: &[&str] = &[
    "Bank", "State Bank", "Savings Bank", "National Bank", "Bank & Trust", "Community Bank",
];

pub(crate) const STREET_NAMES: &[&str] = &[
    "Main", "Oak", "Pine", "Maple", "Cedar", "Elm", "Washington", "Lake", "Hill", "Walnut",
    "Park", "Sunset", "Lincoln", "Jackson", "Church", "Highland", "Mill", "Spring", "Ridge",
    "Meadow", "Prairie", "Willow", "Chestnut", "Hickory", "Forest", "River", "Locust", "Franklin",
];

pub(crate) const STREET_SUFFIXES: &[&str] = &[
    "St", "Ave", "Rd", "Dr", "Ln", "Blvd", "Ct", "Way", "Pl", "Ter",
];

pub(crate) const UNIT_DESIGNATORS: &[&str] = &["Apt", "Suite", "Unit", "#"];

pub(crate) const CITIES: &[(&str, &str)] = &[
    ("Springfield", "IL"),
    ("Peoria", "IL"),
    ("Naperville", "IL"),
    ("Rockford", "IL"),
    ("Champaign", "IL"),
    ("Bloomington", "IN"),
    ("Fort Wayne", "IN"),
    ("Madison", "WI"),
    ("Green Bay", "WI"),
    ("Des Moines", "IA"),
    ("Cedar Rapids", "IA"),
    ("Columbia", "MO"),
    ("Joplin", "MO"),
    ("Lansing", "MI"),
    ("Kalamazoo", "MI"),
    ("Dayton", "OH"),
    ("Toledo", "OH"),
    ("Lexington", "KY"),
    ("Topeka", "KS"),
    ("Lincoln", "NE"),
    ("Fargo", "ND"),
    ("Sioux Falls", "SD"),
    ("Rochester", "MN"),
    ("Duluth", "MN"),
];
