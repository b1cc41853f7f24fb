//! The fixed, curated JavaScript / React / Node question set.
//!
//! Also carries the sample roles and topics offered to clients as suggestions.

use crate::question::{AnswerSource, Difficulty, Question, QuestionType};

/// Topic recorded on a curated session.
pub const CURATED_TOPIC: &str = "Full Stack Curated";

/// Job role recorded on a curated session.
pub const CURATED_ROLE: &str = "Senior Developer";

/// Difficulty recorded on a curated session.
pub const CURATED_DIFFICULTY: Difficulty = Difficulty::Senior;

/// Suggested job roles.
pub const SAMPLE_ROLES: &[&str] = &[
    "Full Stack Developer",
    "Frontend Engineer",
    "Backend Developer",
    "Product Manager",
    "UX Designer",
    "Data Scientist",
    "DevOps Engineer",
];

/// Suggested topics.
pub const SAMPLE_TOPICS: &[&str] = &[
    "React & TypeScript",
    "System Design",
    "Behavioral Questions",
    "Database Optimization",
    "Agile Methodologies",
    "Cloud Infrastructure",
];

struct CuratedEntry {
    id: &'static str,
    topic: &'static str,
    question_type: QuestionType,
    text: &'static str,
    hint: &'static str,
    model_answer: &'static str,
}

const CURATED: &[CuratedEntry] = &[
    // JavaScript coding
    CuratedEntry {
        id: "js-code-1",
        topic: "Algorithms",
        question_type: QuestionType::Code,
        text: "Convert an n-dimensional array to a 1-dimensional array without using `flat` or `reduce`. Use recursion.",
        hint: "Iterate through the array. If an element is an array, call the function recursively.",
        model_answer: r"
function flatten(arr) {
  let res = [];
  for (let i = 0; i < arr.length; i++) {
    Array.isArray(arr[i]) ? res.push(...flatten(arr[i])) : res.push(arr[i]);
  }
  return res;
}",
    },
    CuratedEntry {
        id: "js-code-2",
        topic: "Algorithms",
        question_type: QuestionType::Code,
        text: "Convert an n-dimensional array to a 1-dimensional array using `reduce`.",
        hint: "Use reduce to accumulate values, concatenating recursive calls if the item is an array.",
        model_answer: r"
const flatten = (arr) => arr.reduce((acc, val) =>
  Array.isArray(val) ? acc.concat(flatten(val)) : acc.concat(val), []
);",
    },
    CuratedEntry {
        id: "js-code-3",
        topic: "Object Manipulation",
        question_type: QuestionType::Code,
        text: r#"Print all keys of a nested object in dot notation format (e.g., "qualifications.0.education")."#,
        hint: "Recursively traverse keys. Keep a parent key prefix string.",
        model_answer: r"
function printKeys(obj, prefix = '') {
  for (let key in obj) {
    let fullKey = prefix ? `${prefix}.${key}` : key;
    typeof obj[key] === 'object' && obj[key] ? printKeys(obj[key], fullKey) : console.log(fullKey);
  }
}",
    },
    CuratedEntry {
        id: "js-code-4",
        topic: "Data Structures",
        question_type: QuestionType::Code,
        text: r#"Calculate the frequency count of items in an array and return an object sorted by key (a-z). Input: ["a", "d", "a", "c", ...]"#,
        hint: "Use a map or object for counting, then sort the keys and rebuild the object.",
        model_answer: r"
function getFreq(arr) {
  const counts = arr.reduce((acc, i) => ({...acc, [i]: (acc[i] || 0) + 1}), {});
  return Object.keys(counts).sort().reduce((acc, key) => ({...acc, [key]: counts[key]}), {});
}",
    },
    CuratedEntry {
        id: "js-code-5",
        topic: "String Parsing",
        question_type: QuestionType::Code,
        text: r#"Find the max value from patterned string items in an array. Input: ["10-50-20", "80-90-35"]. Expected Output: [50, 90]."#,
        hint: r#"Split each string by "-", convert to numbers, find max, and push to result."#,
        model_answer: r"
const findMax = (arr) => arr.map(s => Math.max(...s.split('-').map(Number)));",
    },
    CuratedEntry {
        id: "js-code-6",
        topic: "Algorithms",
        question_type: QuestionType::Code,
        text: "Find the missing values in an array of incremental natural numbers (e.g. 1..10). Input: [1, 2, 3, 5, 7, ...].",
        hint: "Iterate from min to max expected values and check if they exist in the array.",
        model_answer: r"
function findMissing(arr) {
  let missing = [], set = new Set(arr);
  for (let i = arr[0]; i <= arr[arr.length-1]; i++) {
    if (!set.has(i)) missing.push(i);
  }
  return missing;
}",
    },
    CuratedEntry {
        id: "js-code-7",
        topic: "Array Logic",
        question_type: QuestionType::Code,
        text: "Remove duplicates from array [10, 11, 9, 11...] and find odd numbers greater than 10.",
        hint: "Use Set for uniqueness, then filter.",
        model_answer: r"
const arr = [10, 11, 9, 11, 8, 5, 2, 9, 15, 5];
const unique = [...new Set(arr)].sort((a,b) => a - b);
const res = unique.filter(n => n % 2 !== 0 && n > 10); // [11, 15]",
    },
    CuratedEntry {
        id: "js-code-8",
        topic: "Deep Clone",
        question_type: QuestionType::Code,
        text: "Implement deep copy of an n-level nested object without external libraries.",
        hint: "Recursive function that handles Arrays and Objects specifically.",
        model_answer: r"
function deepClone(obj) {
  if (!obj || typeof obj !== 'object') return obj;
  if (Array.isArray(obj)) return obj.map(deepClone);
  return Object.fromEntries(Object.entries(obj).map(([k, v]) => [k, deepClone(v)]));
}",
    },
    CuratedEntry {
        id: "js-code-9",
        topic: "Algorithms",
        question_type: QuestionType::Code,
        text: r#"Group anagrams together from an array of strings. Input: ["act","pots","tops","cat"]."#,
        hint: "Sort each string to use as a key in a map.",
        model_answer: r"
function groupAnagrams(strs) {
  const map = {};
  for (let s of strs) {
    let key = s.split('').sort().join('');
    (map[key] = map[key] || []).push(s);
  }
  return Object.values(map);
}",
    },
    // React coding
    CuratedEntry {
        id: "react-code-1",
        topic: "React Hooks",
        question_type: QuestionType::Code,
        text: "Build a Stopwatch component with Start, Stop, and Reset buttons.",
        hint: "Use `setInterval` inside `useEffect` with a running state.",
        model_answer: r"
function Stopwatch() {
  const [t, setT] = useState(0);
  const [run, setRun] = useState(false);
  useEffect(() => {
    let i; if (run) i = setInterval(() => setT(c => c+1), 1000);
    return () => clearInterval(i);
  }, [run]);
  return <>{t}s <button onClick={()=>setRun(true)}>Start</button> <button onClick={()=>setRun(false)}>Stop</button></>;
}",
    },
    CuratedEntry {
        id: "react-code-2",
        topic: "React State",
        question_type: QuestionType::Code,
        text: "Create a To-Do List with an input and Add button. New items appear below.",
        hint: "State array for list, state string for input.",
        model_answer: r"
function Todo() {
  const [list, setList] = useState([]);
  const [val, setVal] = useState('');
  return (
    <>
      <input value={val} onChange={e=>setVal(e.target.value)} />
      <button onClick={()=>{setList([...list, val]); setVal('')}}>Add</button>
      {list.map((t,i) => <div key={i}>{t}</div>)}
    </>
  );
}",
    },
    CuratedEntry {
        id: "react-code-3",
        topic: "React CSS/UI",
        question_type: QuestionType::Code,
        text: "Create a Progress Bar component without external libraries.",
        hint: "A div within a div, inner div width controlled by prop.",
        model_answer: r"
const ProgressBar = ({ v }) => (
  <div style={{background: '#eee', width: '100%'}}>
    <div style={{width: `${v}%`, background: 'blue', height: 10, transition: '0.3s'}} />
  </div>
);",
    },
    CuratedEntry {
        id: "react-code-4",
        topic: "Context API",
        question_type: QuestionType::Code,
        text: r#"Create a ThemeProvider with "Dark" and "Light" modes and a toggle UI."#,
        hint: "Create Context, Provider wraps children, export useTheme hook.",
        model_answer: r"
const Ctx = createContext();
const Provider = ({children}) => {
  const [theme, setTheme] = useState('light');
  return <Ctx.Provider value={{theme, setTheme}}><div className={theme}>{children}</div></Ctx.Provider>;
};",
    },
    CuratedEntry {
        id: "react-code-5",
        topic: "React Hooks",
        question_type: QuestionType::Code,
        text: "Implement a custom hook `useDebounce` to delay a value update.",
        hint: "useEffect with setTimeout that clears on dependency change.",
        model_answer: r"
function useDebounce(val, delay) {
  const [dVal, setDVal] = useState(val);
  useEffect(() => {
    const h = setTimeout(() => setDVal(val), delay);
    return () => clearTimeout(h);
  }, [val, delay]);
  return dVal;
}",
    },
    CuratedEntry {
        id: "react-code-6",
        topic: "Lifecycle",
        question_type: QuestionType::Code,
        text: r#"Console log "Mounted" and "Unmounted" messages for components to demonstrate lifecycle."#,
        hint: "useEffect with empty dependency array and return cleanup function.",
        model_answer: r"
useEffect(() => {
  console.log('Mounted');
  return () => console.log('Unmounted');
}, []);",
    },
    // MongoDB and backend
    CuratedEntry {
        id: "mongo-query",
        topic: "MongoDB Aggregation",
        question_type: QuestionType::Code,
        text: r#"Write a MongoDB query to return a document but filter the "employees" array to only include "Full Stack Developer" roles."#,
        hint: "Use the aggregation pipeline with $project and $filter.",
        model_answer: r#"
db.coll.aggregate([
  { $project: {
      employees: {
        $filter: { input: "$employees", as: "e", cond: { $eq: ["$$e.role", "Full Stack Developer"] } }
      }
  }}
])"#,
    },
    CuratedEntry {
        id: "node-middleware",
        topic: "Express JS",
        question_type: QuestionType::Code,
        text: "Create a common error handling middleware for Express that catches errors from all routes.",
        hint: "Define it after all routes. Function signature must have 4 arguments (err, req, res, next).",
        model_answer: r"
app.use((err, req, res, next) => {
  res.status(500).json({ error: err.message });
});",
    },
    // Theory
    CuratedEntry {
        id: "css-swap",
        topic: "CSS Logic",
        question_type: QuestionType::Text,
        text: "Assume we have 10 cards UI, how to swap 1st card with 5th card only with CSS properties?",
        hint: "Flexbox order.",
        model_answer: "Use CSS Flexbox or Grid and the `order` property. Set the 1st card to `order: 5` and the 5th card to `order: 1`.",
    },
    CuratedEntry {
        id: "js-modules",
        topic: "Module Systems",
        question_type: QuestionType::Text,
        text: "What are the differences between CJS, ESM, and MJS?",
        hint: "require vs import.",
        model_answer: "CJS uses synchronous `require()`, mostly for Node.js. ESM uses asynchronous `import/export`, the standard for browsers. MJS is a file extension to force Node.js to treat files as ESM.",
    },
    CuratedEntry {
        id: "react-fiber",
        topic: "React Internals",
        question_type: QuestionType::Text,
        text: "What is React Fiber and how does it relate to reconciliation?",
        hint: "Incremental rendering.",
        model_answer: "Fiber is React's reconciliation engine that splits rendering work into small units (fibers). This allows React to pause, abort, or prioritize updates, keeping the UI responsive.",
    },
    CuratedEntry {
        id: "js-eventloop-macro",
        topic: "Event Loop",
        question_type: QuestionType::Text,
        text: "Why are setTimeout considered Macrotasks and Promises Microtasks?",
        hint: "Queue priority.",
        model_answer: "Microtasks (Promises) have higher priority and execute immediately after the current script. Macrotasks (setTimeout) are queued to run in the next event loop cycle.",
    },
];

/// Returns the curated question set, in its fixed order.
///
/// Every call yields an identical sequence.
#[must_use]
pub fn curated_questions() -> Vec<Question> {
    CURATED
        .iter()
        .map(|entry| Question {
            id: entry.id.to_string(),
            text: entry.text.to_string(),
            hint: entry.hint.to_string(),
            topic: entry.topic.to_string(),
            question_type: entry.question_type,
            source: AnswerSource::Curated {
                model_answer: entry.model_answer.to_string(),
            },
        })
        .collect()
}
